//! Ratio groups computed from the latest reporting period.
//!
//! Every group is all-or-nothing: if any input it needs is missing the whole
//! group degrades to [`MetricGroup::Unavailable`] rather than reporting a
//! partial set of ratios.

pub mod growth;
pub mod leverage;
pub mod profitability;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::statements::{LineItem, StatementTable};
use crate::types::Money;

/// How many row labels a missing-data diagnostic lists per statement.
const DIAGNOSTIC_ROWS: usize = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of one metric group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricGroup<T> {
    /// Every metric in the group was computed.
    Available(T),
    /// Required line items were not reported.
    Unavailable { missing: Vec<String> },
    /// Not enough reporting periods to compare.
    InsufficientHistory { periods: usize, note: String },
    /// The inputs were present but the arithmetic was degenerate.
    Degenerate { reason: String },
}

impl<T> MetricGroup<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, MetricGroup::Available(_))
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            MetricGroup::Available(v) => Some(v),
            _ => None,
        }
    }

    /// One-line explanation for anything other than `Available`.
    pub fn status_note(&self) -> Option<String> {
        match self {
            MetricGroup::Available(_) => None,
            MetricGroup::Unavailable { missing } => {
                Some(format!("missing line items: {}", missing.join(", ")))
            }
            MetricGroup::InsufficientHistory { note, .. } => Some(note.clone()),
            MetricGroup::Degenerate { reason } => Some(reason.clone()),
        }
    }
}

/// A group result that can be listed as `(human-readable name, value)` pairs.
pub trait MetricSet {
    fn metrics(&self) -> Vec<(&'static str, Decimal)>;
}

// ---------------------------------------------------------------------------
// Required-input collection
// ---------------------------------------------------------------------------

/// Collects the inputs of one group, remembering everything that was missing
/// so the group can fail as a unit.
pub(crate) struct Requirements<'a> {
    group: &'static str,
    missing: Vec<String>,
    consulted: Vec<&'a StatementTable>,
}

impl<'a> Requirements<'a> {
    pub(crate) fn new(group: &'static str) -> Self {
        Self {
            group,
            missing: Vec::new(),
            consulted: Vec::new(),
        }
    }

    /// Look an item up, recording it as missing on failure.
    pub(crate) fn require(
        &mut self,
        table: &'a StatementTable,
        item: LineItem,
        period: usize,
    ) -> Option<Money> {
        if !self.consulted.iter().any(|t| t.kind() == table.kind()) {
            self.consulted.push(table);
        }
        match table.lookup(item, period) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(group = self.group, %err, "required line item unavailable");
                let label = item.label().to_string();
                if !self.missing.contains(&label) {
                    self.missing.push(label);
                }
                None
            }
        }
    }

    /// Emit the operator diagnostic and give up on the whole group.
    pub(crate) fn unavailable<T>(self) -> MetricGroup<T> {
        for table in &self.consulted {
            let available: Vec<&str> = table.labels().into_iter().take(DIAGNOSTIC_ROWS).collect();
            tracing::warn!(
                group = self.group,
                statement = %table.kind(),
                missing = ?self.missing,
                available = ?available,
                "could not find required line items; check provider row names"
            );
        }
        MetricGroup::Unavailable {
            missing: self.missing,
        }
    }
}
