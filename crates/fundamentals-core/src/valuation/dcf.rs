use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FundamentalsError;
use crate::math::{add, mul, safe_divide, sub, sum};
use crate::ratios::{MetricGroup, MetricSet, Requirements};
use crate::statements::{LineItem, StatementStore, LATEST};
use crate::time_value::{discount_factor, future_value};
use crate::types::{with_metadata, ComputationOutput, Money, ProjectionPeriod, Rate};
use crate::FundamentalsResult;

/// Terminal value share of EV above which a warning is raised.
const TERMINAL_WEIGHT_WARNING: Decimal = dec!(0.75);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Assumptions driving the projection. Echoed in every valuation so a memo
/// can cite exactly what was used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfAssumptions {
    /// Annual free cash flow growth, also the perpetuity growth rate
    pub growth_rate: Rate,
    /// Required return used to discount every cash flow
    pub discount_rate: Rate,
    /// Number of explicitly projected years
    pub projection_years: u32,
}

impl Default for DcfAssumptions {
    fn default() -> Self {
        Self {
            growth_rate: dec!(0.05),
            discount_rate: dec!(0.10),
            projection_years: 5,
        }
    }
}

impl DcfAssumptions {
    /// Assumptions as reader-facing `(name, value)` pairs.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Growth Rate", format!("{}%", (self.growth_rate * dec!(100)).normalize())),
            ("Discount Rate", format!("{}%", (self.discount_rate * dec!(100)).normalize())),
            ("Years", self.projection_years.to_string()),
        ]
    }
}

/// Where the base-year free cash flow came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum FcfSource {
    /// The provider reported a Free Cash Flow line
    Reported,
    /// Operating cash flow less the absolute capital expenditure
    Derived {
        operating_cash_flow: Money,
        capital_expenditure: Money,
    },
    /// Supplied directly by the caller
    Supplied,
}

/// Input for a stand-alone DCF run on a known base free cash flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfInput {
    pub base_fcf: Money,
    #[serde(flatten)]
    pub assumptions: DcfAssumptions,
}

/// Projection for a single year of the DCF model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfYearProjection {
    pub period: ProjectionPeriod,
    pub fcf: Money,
    pub discount_factor: Rate,
    pub pv_fcf: Money,
}

/// Output of the DCF valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfValuation {
    /// Enterprise value = PV(projected FCF) + PV(terminal value)
    pub enterprise_value: Money,
    /// Base-year (year 0) free cash flow
    pub current_fcf: Money,
    pub fcf_source: FcfSource,
    /// Sum of present values of the explicit projection years
    pub pv_of_projected_fcf: Money,
    /// Free cash flow one year beyond the projection horizon
    pub terminal_fcf: Money,
    /// Undiscounted Gordon growth terminal value
    pub terminal_value: Money,
    /// Terminal value discounted to today
    pub pv_of_terminal: Money,
    /// PV of terminal value as a share of EV; absent when EV is zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_value_pct: Option<Rate>,
    pub projections: Vec<DcfYearProjection>,
    pub assumptions: DcfAssumptions,
}

impl MetricSet for DcfValuation {
    fn metrics(&self) -> Vec<(&'static str, Decimal)> {
        vec![
            ("Enterprise Value", self.enterprise_value),
            ("Current FCF", self.current_fcf),
            ("Projected FCF (PV)", self.pv_of_projected_fcf),
            ("Terminal Value (PV)", self.pv_of_terminal),
        ]
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value the company in `store` from its latest cash flow statement.
///
/// Base FCF is the reported Free Cash Flow line if present, otherwise
/// Operating Cash Flow less |Capital Expenditure| (missing capex counts as
/// zero). Without either, the group is `Unavailable`.
pub fn dcf_valuation(
    store: &StatementStore,
    assumptions: &DcfAssumptions,
) -> FundamentalsResult<MetricGroup<DcfValuation>> {
    validate_assumptions(assumptions)?;

    let cashflow = store.cash_flow();
    let mut req = Requirements::new("valuation");

    let (base_fcf, source) =
        if let Some(fcf) = req.require(cashflow, LineItem::FreeCashFlow, LATEST) {
            (fcf, FcfSource::Reported)
        } else if let Some(ocf) = req.require(cashflow, LineItem::OperatingCashFlow, LATEST) {
            let capex = cashflow
                .lookup(LineItem::CapitalExpenditure, LATEST)
                .unwrap_or(Decimal::ZERO);
            (
                sub(ocf, capex.abs(), "operating cash flow - capital expenditure")?,
                FcfSource::Derived {
                    operating_cash_flow: ocf,
                    capital_expenditure: capex,
                },
            )
        } else {
            return Ok(req.unavailable());
        };

    project_dcf(base_fcf, source, assumptions).map(MetricGroup::Available)
}

/// Project, discount and cap a base free cash flow.
///
/// For years 1..=N: FCF_y = FCF0 (1+g)^y, PV_y = FCF_y / (1+d)^y.
/// Terminal FCF = FCF0 (1+g)^(N+1), TV = terminal FCF / (d - g),
/// PV(TV) = TV / (1+d)^N.
pub fn project_dcf(
    base_fcf: Money,
    source: FcfSource,
    assumptions: &DcfAssumptions,
) -> FundamentalsResult<DcfValuation> {
    validate_assumptions(assumptions)?;

    let g = assumptions.growth_rate;
    let d = assumptions.discount_rate;
    let n = assumptions.projection_years;

    let projections = build_projections(base_fcf, assumptions)?;
    let pv_of_projected_fcf = sum(projections.iter().map(|p| p.pv_fcf), "PV of projected FCF")?;

    // --- Terminal value ---
    let terminal_fcf = future_value(base_fcf, g, n + 1)?;
    let spread = sub(d, g, "discount rate - growth rate")?;
    let terminal_value = safe_divide(terminal_fcf, spread, "terminal value")?;
    let pv_of_terminal = mul(terminal_value, discount_factor(d, n)?, "PV of terminal value")?;

    // --- Enterprise value ---
    let enterprise_value = add(pv_of_projected_fcf, pv_of_terminal, "enterprise value")?;
    let terminal_value_pct = if enterprise_value.is_zero() {
        None
    } else {
        pv_of_terminal.checked_div(enterprise_value)
    };

    Ok(DcfValuation {
        enterprise_value,
        current_fcf: base_fcf,
        fcf_source: source,
        pv_of_projected_fcf,
        terminal_fcf,
        terminal_value,
        pv_of_terminal,
        terminal_value_pct,
        projections,
        assumptions: assumptions.clone(),
    })
}

/// Stand-alone DCF on a caller-supplied base FCF, wrapped with metadata.
pub fn calculate_dcf(input: &DcfInput) -> FundamentalsResult<ComputationOutput<DcfValuation>> {
    let start = Instant::now();

    let output = project_dcf(input.base_fcf, FcfSource::Supplied, &input.assumptions)?;
    let warnings = valuation_warnings(&output);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Single-stage FCF DCF (Gordon growth terminal value)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Reader-facing caveats about a finished valuation.
pub fn valuation_warnings(valuation: &DcfValuation) -> Vec<String> {
    let mut warnings = Vec::new();
    if valuation.current_fcf <= Decimal::ZERO {
        warnings.push(format!(
            "Base free cash flow is non-positive ({}); the valuation is not meaningful",
            valuation.current_fcf
        ));
    }
    if let Some(pct) = valuation.terminal_value_pct {
        if pct > TERMINAL_WEIGHT_WARNING {
            warnings.push(format!(
                "Terminal value represents {:.1}% of enterprise value; consider extending the explicit forecast period",
                pct.saturating_mul(dec!(100))
            ));
        }
    }
    warnings
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_assumptions(assumptions: &DcfAssumptions) -> FundamentalsResult<()> {
    if assumptions.projection_years == 0 {
        return Err(FundamentalsError::InvalidInput {
            field: "projection_years".into(),
            reason: "At least one projection year is required".into(),
        });
    }
    if assumptions.discount_rate <= dec!(-1) {
        return Err(FundamentalsError::InvalidInput {
            field: "discount_rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    // Gordon growth needs a positive spread between discount and growth
    let spread = sub(
        assumptions.discount_rate,
        assumptions.growth_rate,
        "discount rate - growth rate",
    )?;
    if spread.is_zero() {
        return Err(FundamentalsError::DivisionByZero {
            context: format!(
                "terminal value (discount rate {} equals growth rate {})",
                assumptions.discount_rate, assumptions.growth_rate
            ),
        });
    }
    if spread < Decimal::ZERO {
        return Err(FundamentalsError::FinancialImpossibility(format!(
            "Growth rate ({}) must be less than discount rate ({}) for the Gordon growth model",
            assumptions.growth_rate, assumptions.discount_rate
        )));
    }

    Ok(())
}

fn build_projections(
    base_fcf: Money,
    assumptions: &DcfAssumptions,
) -> FundamentalsResult<Vec<DcfYearProjection>> {
    let n = assumptions.projection_years;
    let mut projections = Vec::with_capacity(n as usize);

    for year in 1..=n {
        let fcf = future_value(base_fcf, assumptions.growth_rate, year)?;
        let factor = discount_factor(assumptions.discount_rate, year)?;
        projections.push(DcfYearProjection {
            period: ProjectionPeriod {
                year,
                label: format!("Year {year}"),
            },
            fcf,
            discount_factor: factor,
            pv_fcf: mul(fcf, factor, "PV of projected FCF")?,
        });
    }

    Ok(projections)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
