use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::line_item::LineItem;
use crate::error::FundamentalsError;
use crate::types::Money;
use crate::FundamentalsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which of the three primary statements a table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::IncomeStatement,
        StatementKind::BalanceSheet,
        StatementKind::CashFlow,
    ];

    /// File-name fragment used when the table is persisted as CSV.
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::IncomeStatement => "income_statement",
            Self::BalanceSheet => "balance_sheet",
            Self::CashFlow => "cashflow",
        }
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::IncomeStatement => "income statement",
            Self::BalanceSheet => "balance sheet",
            Self::CashFlow => "cash flow statement",
        };
        f.write_str(s)
    }
}

/// A reporting period column, e.g. `2024-09-30`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl Period {
    /// Build a period from a provider column header. Headers that start with
    /// an ISO date (`2024-09-30` or `2024-09-30 00:00:00`) also carry it as
    /// `end_date`.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into().trim().to_string();
        let end_date = label
            .get(..10)
            .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok());
        Self { label, end_date }
    }
}

/// One provider row: a label and one optional cell per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRow {
    pub label: String,
    /// `None` marks a period the provider left blank.
    pub values: Vec<Option<Money>>,
}

/// Why a lookup could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("'{label}' is not reported in the {statement} for period {period}")]
    MissingLineItem {
        statement: StatementKind,
        label: String,
        period: usize,
    },

    #[error("{statement} has {available} period(s); period {requested} was requested")]
    InsufficientHistory {
        statement: StatementKind,
        requested: usize,
        available: usize,
    },
}

/// A period-indexed table of line items. Column 0 is the latest period.
///
/// Deserialization goes through `push_row`, so a stored table is held to the
/// same row checks as one built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableRecord")]
pub struct StatementTable {
    kind: StatementKind,
    periods: Vec<Period>,
    rows: Vec<LineItemRow>,
}

#[derive(Deserialize)]
struct TableRecord {
    kind: StatementKind,
    periods: Vec<Period>,
    rows: Vec<LineItemRow>,
}

impl TryFrom<TableRecord> for StatementTable {
    type Error = FundamentalsError;

    fn try_from(record: TableRecord) -> FundamentalsResult<Self> {
        let mut table = StatementTable::new(record.kind, record.periods);
        for row in record.rows {
            table.push_row(row.label, row.values)?;
        }
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl StatementTable {
    /// An empty table with the given period columns, most recent first.
    pub fn new(kind: StatementKind, periods: Vec<Period>) -> Self {
        Self {
            kind,
            periods,
            rows: Vec::new(),
        }
    }

    /// Append a row. The row must carry exactly one cell per period.
    ///
    /// Provider exports occasionally repeat a label; lookups resolve to the
    /// first occurrence, as a label-indexed frame would.
    pub fn push_row(
        &mut self,
        label: impl Into<String>,
        values: Vec<Option<Money>>,
    ) -> FundamentalsResult<()> {
        let label = label.into().trim().to_string();
        if label.is_empty() {
            return Err(FundamentalsError::InvalidInput {
                field: "label".into(),
                reason: format!("{} row label must not be empty", self.kind),
            });
        }
        if values.len() != self.periods.len() {
            return Err(FundamentalsError::InvalidInput {
                field: label,
                reason: format!(
                    "row has {} value(s) but the {} has {} period(s)",
                    values.len(),
                    self.kind,
                    self.periods.len()
                ),
            });
        }
        self.rows.push(LineItemRow { label, values });
        Ok(())
    }

    /// Builder-style [`push_row`](Self::push_row).
    pub fn with_row(
        mut self,
        label: impl Into<String>,
        values: Vec<Option<Money>>,
    ) -> FundamentalsResult<Self> {
        self.push_row(label, values)?;
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Read interface
// ---------------------------------------------------------------------------

impl StatementTable {
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn period(&self, index: usize) -> Option<&Period> {
        self.periods.get(index)
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    pub fn rows(&self) -> &[LineItemRow] {
        &self.rows
    }

    /// Row labels in provider order.
    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn row(&self, label: &str) -> Option<&LineItemRow> {
        let label = label.trim();
        self.rows.iter().find(|r| r.label == label)
    }

    /// Value of a known line item at a period index.
    pub fn lookup(&self, item: LineItem, period: usize) -> Result<Money, LookupError> {
        self.lookup_label(item.label(), period)
    }

    /// Value of an arbitrary provider label at a period index.
    pub fn lookup_label(&self, label: &str, period: usize) -> Result<Money, LookupError> {
        if period >= self.periods.len() {
            return Err(LookupError::InsufficientHistory {
                statement: self.kind,
                requested: period,
                available: self.periods.len(),
            });
        }

        self.row(label)
            .and_then(|row| row.values.get(period).copied().flatten())
            .ok_or_else(|| LookupError::MissingLineItem {
                statement: self.kind,
                label: label.trim().to_string(),
                period,
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
