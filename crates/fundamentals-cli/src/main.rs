mod commands;
mod config;
mod input;
mod llm;
mod output;
mod persist;
mod provider;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analyze::{AnalysisRun, AnalyzeArgs};
use commands::collect::CollectArgs;
use commands::dcf::DcfArgs;
use config::Config;

/// Fundamental analysis and investment memos from public financial statements
#[derive(Parser)]
#[command(
    name = "fundamentals",
    version,
    about = "Fundamental analysis and investment memos from public financial statements",
    long_about = "Collects a company's income statement, balance sheet and cash flow \
                  statement, computes profitability, leverage and growth ratios and a \
                  discounted cash flow valuation, then drafts an investment memo with \
                  a language model. Run without a subcommand to do all of it.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    analyze: AnalyzeArgs,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch statements from Yahoo Finance and save them as CSV
    Collect(CollectArgs),
    /// Run a DCF valuation on a known free cash flow
    Dcf(DcfArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundamentals=info,fundamentals_core=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let code = runtime.block_on(async {
        tokio::select! {
            result = run(cli) => match result {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("{}: {:#}", "error".red().bold(), e);
                    1
                }
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\n{}", "Interrupted by user.".yellow());
                0
            }
        }
    });

    process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env();

    let value = match cli.command {
        None => {
            let run = commands::analyze::run_analyze(cli.analyze, config).await?;
            report(&cli.output, &run)?;
            return Ok(());
        }
        Some(Commands::Collect(args)) => commands::collect::run_collect(args, config).await?,
        Some(Commands::Dcf(args)) => commands::dcf::run_dcf(args)?,
        Some(Commands::Version) => {
            println!("fundamentals {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
    };

    output::format_output(&cli.output, &value);
    Ok(())
}

/// Table mode prints the company summary, the metric sections and the memo
/// for reading. The other formats print only the analysis envelope, so
/// stdout stays machine-readable.
fn report(format: &OutputFormat, run: &AnalysisRun) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", output::table::render_analysis(&run.output, run.profile.as_ref()));
            if let Some(memo) = &run.memo {
                println!("\n{}", "INVESTMENT MEMO".bold());
                println!("{}", "=".repeat(70));
                println!("{}", memo.text);
            }
        }
        _ => output::format_output(format, &serde_json::to_value(&run.output)?),
    }

    eprintln!("\n{} {}", "Analysis saved:".green(), run.analysis_path.display());
    if let Some(path) = &run.memo_path {
        eprintln!("{} {}", "Memo saved:".green(), path.display());
    }
    for path in &run.raw_paths {
        eprintln!("{} {}", "Raw data saved:".green(), path.display());
    }
    Ok(())
}
