use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

use fundamentals_core::analysis::AnalysisSummary;
use fundamentals_core::memo::Memo;

pub fn analysis_path(output_dir: &Path, ticker: &str) -> PathBuf {
    output_dir.join(format!("{ticker}_analysis.json"))
}

pub fn memo_path(output_dir: &Path, ticker: &str) -> PathBuf {
    output_dir.join(format!("{ticker}_investment_memo.md"))
}

/// Pretty JSON of the summary, `{output_dir}/{TICKER}_analysis.json`.
pub fn save_analysis(output_dir: &Path, summary: &AnalysisSummary) -> anyhow::Result<PathBuf> {
    ensure_dir(output_dir)?;
    let path = analysis_path(output_dir, &summary.ticker);
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(&path, json).with_context(|| format!("Failed to write '{}'", path.display()))?;
    Ok(path)
}

/// The memo text as-is, error text included.
pub fn save_memo(output_dir: &Path, ticker: &str, memo: &Memo) -> anyhow::Result<PathBuf> {
    ensure_dir(output_dir)?;
    let path = memo_path(output_dir, ticker);
    fs::write(&path, &memo.text).with_context(|| format!("Failed to write '{}'", path.display()))?;
    Ok(path)
}

fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create '{}'", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundamentals_core::ratios::MetricGroup;

    fn summary() -> AnalysisSummary {
        AnalysisSummary {
            ticker: "MSFT".into(),
            profitability: MetricGroup::Unavailable {
                missing: vec!["Net Income".into()],
            },
            leverage: MetricGroup::Unavailable { missing: vec![] },
            growth: MetricGroup::InsufficientHistory {
                periods: 1,
                note: "Insufficient data for growth calculation".into(),
            },
            valuation: MetricGroup::Degenerate {
                reason: "Division by zero".into(),
            },
        }
    }

    #[test]
    fn test_analysis_json_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("outputs");
        let path = save_analysis(&out, &summary()).unwrap();
        assert_eq!(path, out.join("MSFT_analysis.json"));

        let back: AnalysisSummary =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, summary());
    }

    #[test]
    fn test_memo_written_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let memo = Memo {
            text: "ERROR: Rate limit exceeded. Wait a moment and try again.".into(),
            generated: false,
        };
        let path = save_memo(tmp.path(), "MSFT", &memo).unwrap();
        assert!(path.ends_with("MSFT_investment_memo.md"));
        assert_eq!(fs::read_to_string(path).unwrap(), memo.text);
    }
}
