use clap::Args;
use serde_json::{json, Value};
use std::path::PathBuf;

use super::normalize_ticker;
use crate::config::Config;
use crate::provider::{CsvDirectory, StatementProvider, YahooProvider};

/// Arguments for fetching and caching raw statements
#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Stock ticker to collect
    #[arg(default_value = "AAPL")]
    pub ticker: String,

    /// Directory for raw statement CSVs [env: FUNDAMENTALS_DATA_DIR]
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

pub async fn run_collect(args: CollectArgs, config: Config) -> anyhow::Result<Value> {
    let ticker = normalize_ticker(&args.ticker)?;
    let config = config.with_dirs(args.data_dir, None);
    let yahoo = YahooProvider::new()?.with_retry_delay(config.retry_delay);
    collect_into(&yahoo, &CsvDirectory::new(&config.data_dir), &ticker).await
}

/// Fetch from `provider` and save to `cache`; the result lists what was
/// written per statement and where the company profile went, if there was
/// one.
pub async fn collect_into<P>(provider: &P, cache: &CsvDirectory, ticker: &str) -> anyhow::Result<Value>
where
    P: StatementProvider + ?Sized,
{
    tracing::info!(ticker, provider = provider.name(), "collecting financial statements");
    let store = provider.statements(ticker).await?;
    let written = cache.save(ticker, &store)?;
    let profile = match provider.profile(ticker).await {
        Ok(Some(profile)) if !profile.is_empty() => Some(cache.save_profile(ticker, &profile)?),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(ticker, error = %format!("{e:#}"), "company profile unavailable");
            None
        }
    };

    let statements: Vec<Value> = store
        .tables()
        .iter()
        .zip(&written)
        .map(|(table, path)| {
            json!({
                "statement": table.kind().to_string(),
                "periods": table.period_count(),
                "line_items": table.rows().len(),
                "latest_period": table.period(0).map(|p| p.label.clone()),
                "path": path.display().to_string(),
            })
        })
        .collect();

    Ok(json!({
        "result": {
            "ticker": ticker,
            "source": provider.name(),
            "statements": statements,
            "profile": profile.map(|path| path.display().to_string()),
        }
    }))
}
