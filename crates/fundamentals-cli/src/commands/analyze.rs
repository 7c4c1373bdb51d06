use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};

use fundamentals_core::analysis::{analyze, AnalysisSummary};
use fundamentals_core::memo::{describe_failure, GenerationError, Memo, MemoWriter, TextGenerator};
use fundamentals_core::valuation::dcf::DcfAssumptions;
use fundamentals_core::ComputationOutput;

use super::dcf::DcfFlags;
use super::normalize_ticker;
use crate::config::Config;
use crate::llm::OpenAiClient;
use crate::persist;
use crate::provider::{CompanyProfile, CsvDirectory, StatementProvider, YahooProvider};

/// Arguments for the full workflow: collect, analyze, write the memo, save
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Stock ticker to analyze
    #[arg(default_value = "AAPL")]
    pub ticker: String,

    #[command(flatten)]
    pub dcf: DcfFlags,

    /// Analyze previously collected CSVs instead of fetching from Yahoo Finance
    #[arg(long)]
    pub offline: bool,

    /// Do not call the language model
    #[arg(long)]
    pub skip_memo: bool,

    /// Directory for raw statement CSVs [env: FUNDAMENTALS_DATA_DIR]
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory for the analysis JSON and memo [env: FUNDAMENTALS_OUTPUT_DIR]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// What to do about the memo step.
pub enum MemoPlan<G> {
    Skip,
    /// Memo requested but no generator can be built; the reason becomes the
    /// memo text.
    Unavailable(String),
    Write(MemoWriter<G>),
}

/// Everything one run produced.
pub struct AnalysisRun {
    pub profile: Option<CompanyProfile>,
    pub output: ComputationOutput<AnalysisSummary>,
    pub memo: Option<Memo>,
    pub raw_paths: Vec<PathBuf>,
    pub analysis_path: PathBuf,
    pub memo_path: Option<PathBuf>,
}

pub async fn run_analyze(args: AnalyzeArgs, config: Config) -> anyhow::Result<AnalysisRun> {
    let ticker = normalize_ticker(&args.ticker)?;
    let config = config.with_dirs(args.data_dir, args.output_dir);
    let assumptions = args.dcf.assumptions();
    let cache = CsvDirectory::new(&config.data_dir);

    let memo = if args.skip_memo {
        MemoPlan::Skip
    } else {
        match &config.openai_api_key {
            Some(key) => match OpenAiClient::with_base_url(key.as_str(), config.openai_base_url.as_str()) {
                Ok(client) => MemoPlan::Write(
                    MemoWriter::new(client.with_model(config.openai_model.as_str()))
                        .with_temperature(config.memo_temperature)
                        .with_max_tokens(config.memo_max_tokens),
                ),
                Err(e) => MemoPlan::Unavailable(e.to_string()),
            },
            None => MemoPlan::Unavailable("OPENAI_API_KEY is not set".to_string()),
        }
    };

    if args.offline {
        run_pipeline(&ticker, &cache, None, &assumptions, memo, &config.output_dir).await
    } else {
        let yahoo = YahooProvider::new()?.with_retry_delay(config.retry_delay);
        run_pipeline(&ticker, &yahoo, Some(&cache), &assumptions, memo, &config.output_dir).await
    }
}

/// acquire -> analyze -> memo -> persist.
///
/// Statements and the company profile fetched from `provider` are written
/// to `cache` when given. A missing profile or a failed memo never fails
/// the run; the memo's error text is saved in its place.
pub async fn run_pipeline<P, G>(
    ticker: &str,
    provider: &P,
    cache: Option<&CsvDirectory>,
    assumptions: &DcfAssumptions,
    memo: MemoPlan<G>,
    output_dir: &Path,
) -> anyhow::Result<AnalysisRun>
where
    P: StatementProvider + ?Sized,
    G: TextGenerator,
{
    tracing::info!(ticker, provider = provider.name(), "collecting financial statements");
    let store = provider
        .statements(ticker)
        .await
        .with_context(|| format!("Failed to collect financial statements for {ticker}"))?;

    let profile = match provider.profile(ticker).await {
        Ok(profile) => profile.filter(|p| !p.is_empty()),
        Err(e) => {
            tracing::warn!(ticker, error = %format!("{e:#}"), "company profile unavailable");
            None
        }
    };

    let mut raw_paths = match cache {
        Some(cache) => cache.save(ticker, &store)?,
        None => Vec::new(),
    };
    if let (Some(cache), Some(profile)) = (cache, &profile) {
        raw_paths.push(cache.save_profile(ticker, profile)?);
    }

    tracing::info!(ticker, "computing ratios and valuation");
    let output = analyze(ticker, &store, assumptions)?;

    let memo = match memo {
        MemoPlan::Skip => None,
        MemoPlan::Unavailable(reason) => {
            tracing::warn!(ticker, %reason, "memo generation unavailable");
            Some(Memo {
                text: describe_failure(&GenerationError::NotConfigured(reason)),
                generated: false,
            })
        }
        MemoPlan::Write(writer) => Some(writer.write(&output.result).await),
    };

    let analysis_path = persist::save_analysis(output_dir, &output.result)?;
    let memo_path = memo
        .as_ref()
        .map(|m| persist::save_memo(output_dir, ticker, m))
        .transpose()?;

    tracing::info!(
        ticker,
        analysis = %analysis_path.display(),
        memo = ?memo_path,
        raw_files = raw_paths.len(),
        "outputs saved"
    );

    Ok(AnalysisRun {
        profile,
        output,
        memo,
        raw_paths,
        analysis_path,
        memo_path,
    })
}
