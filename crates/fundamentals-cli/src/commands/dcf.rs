use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::PathBuf;

use fundamentals_core::valuation::dcf::{self, DcfAssumptions, DcfInput};

use crate::input;

/// DCF assumptions shared by every command that values a company
#[derive(Args, Debug, Clone, Default)]
pub struct DcfFlags {
    /// Annual FCF growth rate, also used in perpetuity (e.g. 0.05 for 5%)
    #[arg(long, allow_hyphen_values = true)]
    pub growth_rate: Option<Decimal>,

    /// Discount rate (e.g. 0.10 for 10%)
    #[arg(long, allow_hyphen_values = true)]
    pub discount_rate: Option<Decimal>,

    /// Explicit projection years
    #[arg(long)]
    pub years: Option<u32>,
}

impl DcfFlags {
    /// Flags given on the command line, defaults for the rest.
    pub fn assumptions(&self) -> DcfAssumptions {
        self.apply(DcfAssumptions::default())
    }

    fn apply(&self, base: DcfAssumptions) -> DcfAssumptions {
        DcfAssumptions {
            growth_rate: self.growth_rate.unwrap_or(base.growth_rate),
            discount_rate: self.discount_rate.unwrap_or(base.discount_rate),
            projection_years: self.years.unwrap_or(base.projection_years),
        }
    }
}

/// Arguments for a stand-alone DCF on a known free cash flow
#[derive(Args)]
pub struct DcfArgs {
    /// Base (current) free cash flow
    #[arg(long, allow_hyphen_values = true)]
    pub fcf: Option<Decimal>,

    #[command(flatten)]
    pub assumptions: DcfFlags,

    /// Path to JSON input file with DCF parameters (flags override it)
    #[arg(long)]
    pub input: Option<PathBuf>,
}

pub fn run_dcf(args: DcfArgs) -> anyhow::Result<Value> {
    let dcf_input: DcfInput = if let Some(ref path) = args.input {
        let mut from_file: DcfInput = input::file::read_json(path)?;
        from_file.assumptions = args.assumptions.apply(from_file.assumptions);
        if let Some(fcf) = args.fcf {
            from_file.base_fcf = fcf;
        }
        from_file
    } else {
        DcfInput {
            base_fcf: args
                .fcf
                .context("--fcf is required (or provide --input)")?,
            assumptions: args.assumptions.assumptions(),
        }
    };

    let result = dcf::calculate_dcf(&dcf_input)?;
    Ok(serde_json::to_value(result)?)
}
