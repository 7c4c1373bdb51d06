use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{MetricGroup, MetricSet, Requirements};
use crate::math::percent_of;
use crate::statements::{LineItem, StatementStore, LATEST};
use crate::types::Percent;
use crate::FundamentalsResult;

/// How much of revenue, assets and equity turns into net income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityRatios {
    /// Net income / revenue, in percent
    pub net_profit_margin: Percent,
    /// Net income / total assets, in percent
    pub return_on_assets: Percent,
    /// Net income / stockholders equity, in percent
    pub return_on_equity: Percent,
}

impl MetricSet for ProfitabilityRatios {
    fn metrics(&self) -> Vec<(&'static str, Decimal)> {
        vec![
            ("Net Profit Margin (%)", self.net_profit_margin),
            ("ROA (Return on Assets %)", self.return_on_assets),
            ("ROE (Return on Equity %)", self.return_on_equity),
        ]
    }
}

/// Net profit margin, ROA and ROE for the latest period.
///
/// Needs Total Revenue and Net Income from the income statement and Total
/// Assets and Stockholders Equity from the balance sheet. A zero denominator
/// is reported as `DivisionByZero`.
pub fn profitability_ratios(
    store: &StatementStore,
) -> FundamentalsResult<MetricGroup<ProfitabilityRatios>> {
    let income = store.income_statement();
    let balance = store.balance_sheet();

    let mut req = Requirements::new("profitability");
    let revenue = req.require(income, LineItem::TotalRevenue, LATEST);
    let net_income = req.require(income, LineItem::NetIncome, LATEST);
    let total_assets = req.require(balance, LineItem::TotalAssets, LATEST);
    let equity = req.require(balance, LineItem::StockholdersEquity, LATEST);

    let (Some(revenue), Some(net_income), Some(total_assets), Some(equity)) =
        (revenue, net_income, total_assets, equity)
    else {
        return Ok(req.unavailable());
    };

    Ok(MetricGroup::Available(ProfitabilityRatios {
        net_profit_margin: percent_of(net_income, revenue, "net income / total revenue")?,
        return_on_assets: percent_of(net_income, total_assets, "net income / total assets")?,
        return_on_equity: percent_of(net_income, equity, "net income / stockholders equity")?,
    }))
}
