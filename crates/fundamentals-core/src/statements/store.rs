use serde::{Deserialize, Serialize};

use super::table::{StatementKind, StatementTable};
use crate::error::FundamentalsError;
use crate::FundamentalsResult;

/// The three primary statements of one company, populated once and then
/// only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoreRecord")]
pub struct StatementStore {
    income: StatementTable,
    balance: StatementTable,
    cashflow: StatementTable,
}

#[derive(Deserialize)]
struct StoreRecord {
    income: StatementTable,
    balance: StatementTable,
    cashflow: StatementTable,
}

impl TryFrom<StoreRecord> for StatementStore {
    type Error = FundamentalsError;

    fn try_from(record: StoreRecord) -> FundamentalsResult<Self> {
        StatementStore::new(record.income, record.balance, record.cashflow)
    }
}

impl StatementStore {
    pub fn new(
        income: StatementTable,
        balance: StatementTable,
        cashflow: StatementTable,
    ) -> FundamentalsResult<Self> {
        expect_kind(&income, StatementKind::IncomeStatement)?;
        expect_kind(&balance, StatementKind::BalanceSheet)?;
        expect_kind(&cashflow, StatementKind::CashFlow)?;
        Ok(Self {
            income,
            balance,
            cashflow,
        })
    }

    pub fn income_statement(&self) -> &StatementTable {
        &self.income
    }

    pub fn balance_sheet(&self) -> &StatementTable {
        &self.balance
    }

    pub fn cash_flow(&self) -> &StatementTable {
        &self.cashflow
    }

    pub fn table(&self, kind: StatementKind) -> &StatementTable {
        match kind {
            StatementKind::IncomeStatement => &self.income,
            StatementKind::BalanceSheet => &self.balance,
            StatementKind::CashFlow => &self.cashflow,
        }
    }

    pub fn tables(&self) -> [&StatementTable; 3] {
        [&self.income, &self.balance, &self.cashflow]
    }
}

fn expect_kind(table: &StatementTable, kind: StatementKind) -> FundamentalsResult<()> {
    if table.kind() != kind {
        return Err(FundamentalsError::InvalidInput {
            field: kind.file_stem().into(),
            reason: format!("expected a {kind} table, got a {}", table.kind()),
        });
    }
    Ok(())
}
