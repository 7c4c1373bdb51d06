use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FundamentalsError;
use crate::ratios::growth::{growth_metrics, GrowthMetrics};
use crate::ratios::leverage::{leverage_ratios, LeverageRatios};
use crate::ratios::profitability::{profitability_ratios, ProfitabilityRatios};
use crate::ratios::MetricGroup;
use crate::statements::{StatementKind, StatementStore};
use crate::types::{with_metadata, ComputationOutput};
use crate::valuation::dcf::{dcf_valuation, valuation_warnings, DcfAssumptions, DcfValuation};
use crate::FundamentalsResult;

pub const PROFITABILITY_SECTION: &str = "Profitability Ratios";
pub const LEVERAGE_SECTION: &str = "Leverage Ratios";
pub const GROWTH_SECTION: &str = "Growth Metrics";
pub const VALUATION_SECTION: &str = "DCF Valuation";

/// Everything computed for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub ticker: String,
    pub profitability: MetricGroup<ProfitabilityRatios>,
    pub leverage: MetricGroup<LeverageRatios>,
    pub growth: MetricGroup<GrowthMetrics>,
    pub valuation: MetricGroup<DcfValuation>,
}

/// Inputs echoed into the computation envelope.
#[derive(Debug, Serialize)]
struct AnalysisAssumptions<'a> {
    ticker: &'a str,
    income_statement_periods: usize,
    balance_sheet_periods: usize,
    cash_flow_periods: usize,
    dcf: &'a DcfAssumptions,
}

/// Run every metric group against `store` and assemble the summary.
///
/// Groups are independent: a missing line item or degenerate input in one
/// never prevents the others from being reported. Anything short of a
/// complete group is listed in the envelope's warnings.
pub fn analyze(
    ticker: &str,
    store: &StatementStore,
    assumptions: &DcfAssumptions,
) -> FundamentalsResult<ComputationOutput<AnalysisSummary>> {
    let start = Instant::now();
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(FundamentalsError::InvalidInput {
            field: "ticker".into(),
            reason: "Ticker must not be empty".into(),
        });
    }

    let mut warnings: Vec<String> = Vec::new();

    let profitability = settle(PROFITABILITY_SECTION, profitability_ratios(store), &mut warnings);
    let leverage = settle(LEVERAGE_SECTION, leverage_ratios(store), &mut warnings);
    let growth = settle(GROWTH_SECTION, growth_metrics(store), &mut warnings);
    let valuation = settle(
        VALUATION_SECTION,
        dcf_valuation(store, assumptions),
        &mut warnings,
    );
    if let Some(v) = valuation.available() {
        warnings.extend(
            valuation_warnings(v)
                .into_iter()
                .map(|w| format!("{VALUATION_SECTION}: {w}")),
        );
    }

    tracing::info!(
        ticker,
        profitability = profitability.is_available(),
        leverage = leverage.is_available(),
        growth = growth.is_available(),
        valuation = valuation.is_available(),
        "analysis complete"
    );

    let summary = AnalysisSummary {
        ticker: ticker.to_string(),
        profitability,
        leverage,
        growth,
        valuation,
    };

    let echoed = AnalysisAssumptions {
        ticker,
        income_statement_periods: store.table(StatementKind::IncomeStatement).period_count(),
        balance_sheet_periods: store.table(StatementKind::BalanceSheet).period_count(),
        cash_flow_periods: store.table(StatementKind::CashFlow).period_count(),
        dcf: assumptions,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Latest-period ratios, YoY growth and single-stage FCF DCF",
        &echoed,
        warnings,
        elapsed,
        summary,
    ))
}

/// Fold a calculator error into a `Degenerate` group and note anything that
/// is not a complete result.
fn settle<T>(
    section: &str,
    outcome: FundamentalsResult<MetricGroup<T>>,
    warnings: &mut Vec<String>,
) -> MetricGroup<T> {
    let group = outcome.unwrap_or_else(|e| {
        tracing::warn!(section, error = %e, "metric group could not be computed");
        MetricGroup::Degenerate {
            reason: e.to_string(),
        }
    });
    if let Some(note) = group.status_note() {
        warnings.push(format!("{section}: {note}"));
    }
    group
}
