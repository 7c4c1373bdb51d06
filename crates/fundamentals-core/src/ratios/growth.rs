use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{MetricGroup, MetricSet, Requirements};
use crate::math::percent_change;
use crate::statements::{LineItem, StatementStore, LATEST, PRIOR};
use crate::types::Percent;
use crate::FundamentalsResult;

pub const INSUFFICIENT_HISTORY_NOTE: &str = "Insufficient data for growth calculation";

/// Year-over-year change between the two most recent income statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    pub revenue_growth_yoy: Percent,
    pub net_income_growth_yoy: Percent,
    /// Label of the latest period compared
    pub current_period: String,
    /// Label of the prior period compared
    pub previous_period: String,
}

impl MetricSet for GrowthMetrics {
    fn metrics(&self) -> Vec<(&'static str, Decimal)> {
        vec![
            ("Revenue Growth YoY (%)", self.revenue_growth_yoy),
            ("Net Income Growth YoY (%)", self.net_income_growth_yoy),
        ]
    }
}

/// Revenue and net income growth, latest period vs the one before.
///
/// With fewer than two periods this returns the informational
/// `InsufficientHistory` placeholder, never an error.
pub fn growth_metrics(store: &StatementStore) -> FundamentalsResult<MetricGroup<GrowthMetrics>> {
    let income = store.income_statement();

    if income.period_count() < 2 {
        return Ok(MetricGroup::InsufficientHistory {
            periods: income.period_count(),
            note: INSUFFICIENT_HISTORY_NOTE.to_string(),
        });
    }

    let mut req = Requirements::new("growth");
    let current_revenue = req.require(income, LineItem::TotalRevenue, LATEST);
    let previous_revenue = req.require(income, LineItem::TotalRevenue, PRIOR);
    let current_ni = req.require(income, LineItem::NetIncome, LATEST);
    let previous_ni = req.require(income, LineItem::NetIncome, PRIOR);

    let (Some(current_revenue), Some(previous_revenue), Some(current_ni), Some(previous_ni)) =
        (current_revenue, previous_revenue, current_ni, previous_ni)
    else {
        return Ok(req.unavailable());
    };

    let label = |i: usize| income.period(i).map(|p| p.label.clone()).unwrap_or_default();

    Ok(MetricGroup::Available(GrowthMetrics {
        revenue_growth_yoy: percent_change(
            current_revenue,
            previous_revenue,
            "revenue growth (prior-year revenue)",
        )?,
        net_income_growth_yoy: percent_change(
            current_ni,
            previous_ni,
            "net income growth (prior-year net income)",
        )?,
        current_period: label(LATEST),
        previous_period: label(PRIOR),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statements::{Period, StatementKind, StatementTable};
    use rust_decimal_macros::dec;

    fn store_with_income(income: StatementTable) -> StatementStore {
        StatementStore::new(
            income,
            StatementTable::new(StatementKind::BalanceSheet, vec![]),
            StatementTable::new(StatementKind::CashFlow, vec![]),
        )
        .unwrap()
    }

    #[test]
    fn test_growth_two_periods() {
        let income = StatementTable::new(
            StatementKind::IncomeStatement,
            vec![Period::new("2024-12-31"), Period::new("2023-12-31")],
        )
        .with_row("Total Revenue", vec![Some(dec!(100)), Some(dec!(80))])
        .unwrap()
        .with_row("Net Income", vec![Some(dec!(20)), Some(dec!(10))])
        .unwrap();

        let out = growth_metrics(&store_with_income(income)).unwrap();
        let g = out.available().unwrap();
        assert_eq!(g.revenue_growth_yoy, dec!(25));
        assert_eq!(g.net_income_growth_yoy, dec!(100));
        assert_eq!(g.current_period, "2024-12-31");
        assert_eq!(g.previous_period, "2023-12-31");
    }

    #[test]
    fn test_growth_single_period_placeholder() {
        let income = StatementTable::new(StatementKind::IncomeStatement, vec![Period::new("2024")])
            .with_row("Total Revenue", vec![Some(dec!(100))])
            .unwrap();
        let out = growth_metrics(&store_with_income(income)).unwrap();
        assert_eq!(
            out,
            MetricGroup::InsufficientHistory {
                periods: 1,
                note: INSUFFICIENT_HISTORY_NOTE.into(),
            }
        );
    }

    #[test]
    fn test_growth_missing_prior_net_income() {
        let income = StatementTable::new(
            StatementKind::IncomeStatement,
            vec![Period::new("2024"), Period::new("2023")],
        )
        .with_row("Total Revenue", vec![Some(dec!(100)), Some(dec!(80))])
        .unwrap()
        .with_row("Net Income", vec![Some(dec!(20)), None])
        .unwrap();
        let out = growth_metrics(&store_with_income(income)).unwrap();
        assert_eq!(
            out,
            MetricGroup::Unavailable {
                missing: vec!["Net Income".into()],
            }
        );
    }
}
