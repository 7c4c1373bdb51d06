use crate::analysis::summary::{
    GROWTH_SECTION, LEVERAGE_SECTION, PROFITABILITY_SECTION, VALUATION_SECTION,
};
use crate::analysis::{format_metric_value, AnalysisSummary, SectionView};

pub const SYSTEM_PROMPT: &str = "You are a senior equity research analyst at a top-tier \
asset management firm. Write clear, professional investment memos based on fundamental \
analysis. Be concise but thorough. Always cite specific numbers from the data provided. \
Be objective and highlight both positives and risks.";

const MEMO_OUTLINE: &str = "\
Please structure the memo as follows:

1. **Executive Summary** (2-3 sentences)
   - Quick overview and recommendation

2. **Investment Thesis**
   - Why buy/sell/hold?
   - Key value drivers

3. **Financial Analysis**
   - Profitability assessment (cite specific margins and returns)
   - Balance sheet strength (cite leverage ratios)
   - Growth trajectory (cite YoY growth rates)

4. **Valuation**
   - DCF results interpretation
   - Is the company undervalued or overvalued?
   - Fair value estimate

5. **Key Risks**
   - What could go wrong?
   - Financial vulnerabilities
   - Market/competitive risks

6. **Recommendation**
   - Clear Buy/Hold/Sell rating
   - Conviction level (High/Medium/Low)
   - Key catalysts to watch

**Important Instructions:**
- Use professional language but keep it clear
- Cite specific numbers from the analysis (e.g., \"With an ROE of 164%...\")
- Be objective - mention both strengths and weaknesses
- Make a clear, actionable recommendation
- Keep the total memo to 500-800 words
";

/// Render the user prompt for a memo on `summary`.
pub fn build_prompt(summary: &AnalysisSummary) -> String {
    let sections = summary.sections();
    let body = |title: &str| {
        sections
            .iter()
            .find(|s| s.title == title)
            .map(format_section)
            .unwrap_or_else(|| "No data available".to_string())
    };
    let ticker = &summary.ticker;

    format!(
        "Please write a professional 1-2 page investment memo for {ticker} based on the following fundamental analysis:\n\
         \n\
         ## Company: {ticker}\n\
         \n\
         ## Financial Ratios:\n\
         \n\
         ### Profitability:\n\
         {profitability}\n\
         \n\
         ### Leverage:\n\
         {leverage}\n\
         \n\
         ### Growth:\n\
         {growth}\n\
         \n\
         ## Valuation (DCF Analysis):\n\
         {valuation}\n\
         \n\
         ---\n\
         \n\
         {outline}",
        profitability = body(PROFITABILITY_SECTION),
        leverage = body(LEVERAGE_SECTION),
        growth = body(GROWTH_SECTION),
        valuation = body(VALUATION_SECTION),
        outline = MEMO_OUTLINE,
    )
}

/// Bullet list for one section, or a "No data available" line.
pub fn format_section(section: &SectionView) -> String {
    if section.is_empty() {
        return match &section.note {
            Some(note) => format!("No data available ({note})"),
            None => "No data available".to_string(),
        };
    }

    let mut lines: Vec<String> = section
        .metrics
        .iter()
        .map(|(name, value)| format!("- {name}: {}", format_metric_value(*value)))
        .collect();

    if !section.details.is_empty() {
        lines.push("**Assumptions:**".to_string());
        lines.extend(
            section
                .details
                .iter()
                .map(|(name, value)| format!("  - {name}: {value}")),
        );
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratios::growth::GrowthMetrics;
    use crate::ratios::MetricGroup;
    use crate::valuation::dcf::{project_dcf, DcfAssumptions, FcfSource};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn summary() -> AnalysisSummary {
        AnalysisSummary {
            ticker: "AAPL".into(),
            profitability: MetricGroup::Unavailable {
                missing: vec!["Stockholders Equity".into()],
            },
            leverage: MetricGroup::Degenerate {
                reason: "Division by zero in total debt / stockholders equity".into(),
            },
            growth: MetricGroup::Available(GrowthMetrics {
                revenue_growth_yoy: dec!(25),
                net_income_growth_yoy: dec!(100),
                current_period: "2024".into(),
                previous_period: "2023".into(),
            }),
            valuation: MetricGroup::Available(
                project_dcf(dec!(120000000), FcfSource::Supplied, &DcfAssumptions::default())
                    .unwrap(),
            ),
        }
    }


    #[test]
    fn test_valuation_section_lists_assumptions() {
        let s = summary();
        let sections = s.sections();
        let text = format_section(&sections[3]);
        assert_eq!(
            text,
            "- Enterprise Value: $2,520,000,000\n\
             - Current FCF: $120,000,000\n\
             - Projected FCF (PV): $522,974,500\n\
             - Terminal Value (PV): $1,997,025,500\n\
             **Assumptions:**\n  \
             - Growth Rate: 5%\n  \
             - Discount Rate: 10%\n  \
             - Years: 5"
        );
    }

    #[test]
    fn test_prompt_structure() {
        let prompt = build_prompt(&summary());
        assert!(prompt.starts_with(
            "Please write a professional 1-2 page investment memo for AAPL"
        ));
        assert!(prompt.contains("## Company: AAPL"));
        assert!(prompt.contains(
            "### Profitability:\nNo data available (missing line items: Stockholders Equity)"
        ));
        assert!(prompt.contains("### Growth:\n- Revenue Growth YoY (%): 25.00\n"));
        assert!(prompt.contains("6. **Recommendation**"));
    }
}
