use serde::{Deserialize, Serialize};

use super::table::StatementKind;

/// Line items the engine knows how to consume, keyed by the labels the
/// upstream provider publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineItem {
    TotalRevenue,
    NetIncome,
    TotalAssets,
    StockholdersEquity,
    TotalDebt,
    OperatingCashFlow,
    CapitalExpenditure,
    FreeCashFlow,
}

impl LineItem {
    pub const ALL: [LineItem; 8] = [
        LineItem::TotalRevenue,
        LineItem::NetIncome,
        LineItem::TotalAssets,
        LineItem::StockholdersEquity,
        LineItem::TotalDebt,
        LineItem::OperatingCashFlow,
        LineItem::CapitalExpenditure,
        LineItem::FreeCashFlow,
    ];

    /// Row label as it appears in the provider's statement.
    pub fn label(self) -> &'static str {
        match self {
            Self::TotalRevenue => "Total Revenue",
            Self::NetIncome => "Net Income",
            Self::TotalAssets => "Total Assets",
            Self::StockholdersEquity => "Stockholders Equity",
            Self::TotalDebt => "Total Debt",
            Self::OperatingCashFlow => "Operating Cash Flow",
            Self::CapitalExpenditure => "Capital Expenditure",
            Self::FreeCashFlow => "Free Cash Flow",
        }
    }

    /// Statement the item is published on.
    pub fn statement(self) -> StatementKind {
        match self {
            Self::TotalRevenue | Self::NetIncome => StatementKind::IncomeStatement,
            Self::TotalAssets | Self::StockholdersEquity | Self::TotalDebt => {
                StatementKind::BalanceSheet
            }
            Self::OperatingCashFlow | Self::CapitalExpenditure | Self::FreeCashFlow => {
                StatementKind::CashFlow
            }
        }
    }
}

impl std::fmt::Display for LineItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_unique() {
        let mut labels: Vec<&str> = LineItem::ALL.iter().map(|i| i.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), LineItem::ALL.len());
    }

    #[test]
    fn test_statement_placement() {
        assert_eq!(LineItem::NetIncome.statement(), StatementKind::IncomeStatement);
        assert_eq!(LineItem::TotalDebt.statement(), StatementKind::BalanceSheet);
        assert_eq!(LineItem::FreeCashFlow.statement(), StatementKind::CashFlow);
    }
}
