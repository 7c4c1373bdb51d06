use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{MetricGroup, MetricSet, Requirements};
use crate::math::safe_divide;
use crate::statements::{LineItem, StatementStore, LATEST};
use crate::types::Multiple;
use crate::FundamentalsResult;

/// Balance-sheet leverage for the latest period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageRatios {
    pub debt_to_equity: Multiple,
    pub debt_to_assets: Multiple,
    /// Total assets / stockholders equity
    pub equity_multiplier: Multiple,
}

impl MetricSet for LeverageRatios {
    fn metrics(&self) -> Vec<(&'static str, Decimal)> {
        vec![
            ("Debt-to-Equity", self.debt_to_equity),
            ("Debt-to-Assets", self.debt_to_assets),
            ("Equity Multiplier", self.equity_multiplier),
        ]
    }
}

/// Debt-to-equity, debt-to-assets and the equity multiplier.
pub fn leverage_ratios(store: &StatementStore) -> FundamentalsResult<MetricGroup<LeverageRatios>> {
    let balance = store.balance_sheet();

    let mut req = Requirements::new("leverage");
    let total_debt = req.require(balance, LineItem::TotalDebt, LATEST);
    let equity = req.require(balance, LineItem::StockholdersEquity, LATEST);
    let total_assets = req.require(balance, LineItem::TotalAssets, LATEST);

    let (Some(total_debt), Some(equity), Some(total_assets)) = (total_debt, equity, total_assets)
    else {
        return Ok(req.unavailable());
    };

    Ok(MetricGroup::Available(LeverageRatios {
        debt_to_equity: safe_divide(total_debt, equity, "total debt / stockholders equity")?,
        debt_to_assets: safe_divide(total_debt, total_assets, "total debt / total assets")?,
        equity_multiplier: safe_divide(total_assets, equity, "total assets / stockholders equity")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statements::{Period, StatementKind, StatementTable};
    use rust_decimal_macros::dec;

    fn store_with_balance(balance: StatementTable) -> StatementStore {
        StatementStore::new(
            StatementTable::new(StatementKind::IncomeStatement, vec![Period::new("2024")]),
            balance,
            StatementTable::new(StatementKind::CashFlow, vec![Period::new("2024")]),
        )
        .unwrap()
    }

    #[test]
    fn test_leverage_basic() {
        let balance = StatementTable::new(StatementKind::BalanceSheet, vec![Period::new("2024")])
            .with_row("Total Assets", vec![Some(dec!(200))])
            .unwrap()
            .with_row("Stockholders Equity", vec![Some(dec!(100))])
            .unwrap()
            .with_row("Total Debt", vec![Some(dec!(50))])
            .unwrap();
        let out = leverage_ratios(&store_with_balance(balance)).unwrap();
        let r = out.available().unwrap();
        assert_eq!(r.debt_to_equity, dec!(0.5));
        assert_eq!(r.debt_to_assets, dec!(0.25));
        assert_eq!(r.equity_multiplier, dec!(2));
    }

    #[test]
    fn test_leverage_without_total_debt() {
        // Debt-free filers often omit the row entirely
        let balance = StatementTable::new(StatementKind::BalanceSheet, vec![Period::new("2024")])
            .with_row("Total Assets", vec![Some(dec!(200))])
            .unwrap()
            .with_row("Stockholders Equity", vec![Some(dec!(100))])
            .unwrap();
        let out = leverage_ratios(&store_with_balance(balance)).unwrap();
        assert_eq!(
            out,
            MetricGroup::Unavailable {
                missing: vec!["Total Debt".into()],
            }
        );
    }

    #[test]
    fn test_leverage_zero_equity() {
        let balance = StatementTable::new(StatementKind::BalanceSheet, vec![Period::new("2024")])
            .with_row("Total Assets", vec![Some(dec!(200))])
            .unwrap()
            .with_row("Stockholders Equity", vec![Some(dec!(0))])
            .unwrap()
            .with_row("Total Debt", vec![Some(dec!(50))])
            .unwrap();
        assert!(leverage_ratios(&store_with_balance(balance)).is_err());
    }
}
