use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::summary::{
    AnalysisSummary, GROWTH_SECTION, LEVERAGE_SECTION, PROFITABILITY_SECTION, VALUATION_SECTION,
};
use crate::ratios::{MetricGroup, MetricSet};

/// Values above this magnitude are rendered as whole dollars.
const CURRENCY_THRESHOLD: Decimal = dec!(1000000);

/// Flattened, reader-facing view of one summary section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionView {
    pub title: &'static str,
    /// Numeric metrics keyed by human-readable name, in display order
    pub metrics: Vec<(&'static str, Decimal)>,
    /// Nested non-numeric details (the DCF assumption set)
    pub details: Vec<(&'static str, String)>,
    /// Explanation when the group is not available
    pub note: Option<String>,
}

impl SectionView {
    fn from_group<T: MetricSet>(title: &'static str, group: &MetricGroup<T>) -> Self {
        Self {
            title,
            metrics: group.available().map(|g| g.metrics()).unwrap_or_default(),
            details: Vec::new(),
            note: group.status_note(),
        }
    }

    /// No metrics and no details; only the note, if any, is left to show.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.details.is_empty()
    }
}

impl AnalysisSummary {
    /// Sections in report order.
    pub fn sections(&self) -> Vec<SectionView> {
        let mut valuation = SectionView::from_group(VALUATION_SECTION, &self.valuation);
        if let Some(v) = self.valuation.available() {
            valuation.details = v.assumptions.describe();
        }

        vec![
            SectionView::from_group(PROFITABILITY_SECTION, &self.profitability),
            SectionView::from_group(LEVERAGE_SECTION, &self.leverage),
            SectionView::from_group(GROWTH_SECTION, &self.growth),
            valuation,
        ]
    }
}

/// `$1,234,567` above one million in magnitude, two decimals otherwise.
pub fn format_metric_value(value: Decimal) -> String {
    if value.abs() > CURRENCY_THRESHOLD {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        format!("${sign}{}", group_thousands(value.abs().round_dp(0)))
    } else {
        format!("{:.2}", value)
    }
}

fn group_thousands(whole: Decimal) -> String {
    let digits = whole.trunc().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratios::leverage::LeverageRatios;

    #[test]
    fn test_sections_order_and_notes() {
        let summary = AnalysisSummary {
            ticker: "TEST".into(),
            profitability: MetricGroup::Unavailable {
                missing: vec!["Net Income".into()],
            },
            leverage: MetricGroup::Available(LeverageRatios {
                debt_to_equity: dec!(0.5),
                debt_to_assets: dec!(0.25),
                equity_multiplier: dec!(2),
            }),
            growth: MetricGroup::InsufficientHistory {
                periods: 1,
                note: "Insufficient data for growth calculation".into(),
            },
            valuation: MetricGroup::Unavailable {
                missing: vec!["Free Cash Flow".into(), "Operating Cash Flow".into()],
            },
        };

        let sections = summary.sections();
        let titles: Vec<&str> = sections.iter().map(|s| s.title).collect();
        assert_eq!(
            titles,
            vec!["Profitability Ratios", "Leverage Ratios", "Growth Metrics", "DCF Valuation"]
        );
        assert!(sections[0].is_empty());
        assert_eq!(sections[0].note.as_deref(), Some("missing line items: Net Income"));
        assert_eq!(sections[1].metrics[0], ("Debt-to-Equity", dec!(0.5)));
        assert!(sections[1].note.is_none());
        assert!(sections[3].details.is_empty());
    }

    #[test]
    fn test_format_metric_value() {
        assert_eq!(format_metric_value(dec!(20)), "20.00");
        assert_eq!(format_metric_value(dec!(0.5)), "0.50");
        assert_eq!(format_metric_value(dec!(1000000)), "1000000.00");
        assert_eq!(format_metric_value(dec!(2520000000.4)), "$2,520,000,000");
        assert_eq!(format_metric_value(dec!(-1234567.6)), "$-1,234,568");
    }
}
