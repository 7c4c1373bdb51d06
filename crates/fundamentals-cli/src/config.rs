use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use fundamentals_core::memo::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

use crate::provider::yahoo::DEFAULT_RETRY_DELAY;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_DATA_DIR: &str = "data/raw";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Runtime settings, read from the environment (and `.env`) and then
/// overridden by command-line flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub memo_temperature: f64,
    pub memo_max_tokens: u32,
    /// Pause between Yahoo Finance retries after HTTP 429
    pub retry_delay: Duration,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            memo_temperature: DEFAULT_TEMPERATURE,
            memo_max_tokens: DEFAULT_MAX_TOKENS,
            retry_delay: DEFAULT_RETRY_DELAY,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: get("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            memo_temperature: parsed(&get, "OPENAI_TEMPERATURE").unwrap_or(defaults.memo_temperature),
            memo_max_tokens: parsed(&get, "OPENAI_MAX_TOKENS").unwrap_or(defaults.memo_max_tokens),
            retry_delay: parsed::<f64>(&get, "YAHOO_RETRY_DELAY_SECS")
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .unwrap_or(defaults.retry_delay),
            data_dir: get("FUNDAMENTALS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            output_dir: get("FUNDAMENTALS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        }
    }

    /// Apply directory overrides given on the command line.
    pub fn with_dirs(mut self, data_dir: Option<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        self
    }
}

/// A numeric setting; values that do not parse are ignored with a warning.
fn parsed<T: FromStr>(get: impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = get(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}
