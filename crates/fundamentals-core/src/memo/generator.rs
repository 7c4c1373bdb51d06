use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::analysis::AnalysisSummary;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// A single text-generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Failure reported by a text generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("not configured: {0}")]
    NotConfigured(String),
}

/// Anything that can turn a prompt into prose.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short identifier for logs, e.g. `openai:gpt-4o-mini`.
    fn name(&self) -> String;

    async fn generate(&self, request: &MemoRequest) -> Result<String, GenerationError>;
}

/// Memo text, or the error text that replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memo {
    pub text: String,
    pub generated: bool,
}

/// Drives a [`TextGenerator`] for one analysis summary.
pub struct MemoWriter<G> {
    generator: G,
    temperature: f64,
    max_tokens: u32,
}

impl<G: TextGenerator> MemoWriter<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn request_for(&self, summary: &AnalysisSummary) -> MemoRequest {
        MemoRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(summary),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Generate the memo. Never fails: generator errors come back as
    /// readable `ERROR: ...` text with `generated == false`.
    pub async fn write(&self, summary: &AnalysisSummary) -> Memo {
        let request = self.request_for(summary);
        let generator = self.generator.name();
        tracing::info!(ticker = %summary.ticker, %generator, "generating investment memo");

        match self.generator.generate(&request).await {
            Ok(text) if !text.trim().is_empty() => Memo {
                text,
                generated: true,
            },
            Ok(_) => failed(&GenerationError::EmptyResponse),
            Err(err) => {
                tracing::warn!(ticker = %summary.ticker, %generator, error = %err, "memo generation failed");
                failed(&err)
            }
        }
    }
}

fn failed(err: &GenerationError) -> Memo {
    Memo {
        text: describe_failure(err),
        generated: false,
    }
}

/// Reader-facing text for a generation failure.
pub fn describe_failure(err: &GenerationError) -> String {
    match err {
        GenerationError::Authentication(_) => {
            "ERROR: Invalid API key. Check your .env file.".to_string()
        }
        GenerationError::RateLimited(_) => {
            "ERROR: Rate limit exceeded. Wait a moment and try again.".to_string()
        }
        GenerationError::Api { status, message } => {
            format!("ERROR: API error (HTTP {status}): {message}")
        }
        other => format!("ERROR: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratios::MetricGroup;
    use std::sync::Mutex;

    struct Canned {
        reply: Result<String, GenerationError>,
        seen: Mutex<Vec<MemoRequest>>,
    }

    impl Canned {
        fn new(reply: Result<String, GenerationError>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Canned {
        fn name(&self) -> String {
            "canned".into()
        }

        async fn generate(&self, request: &MemoRequest) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    fn summary() -> AnalysisSummary {
        AnalysisSummary {
            ticker: "MSFT".into(),
            profitability: MetricGroup::Unavailable { missing: vec![] },
            leverage: MetricGroup::Unavailable { missing: vec![] },
            growth: MetricGroup::Unavailable { missing: vec![] },
            valuation: MetricGroup::Unavailable { missing: vec![] },
        }
    }

    #[tokio::test]
    async fn test_successful_memo() {
        let writer = MemoWriter::new(Canned::new(Ok("# Memo\nBuy.".into())));
        let memo = writer.write(&summary()).await;
        assert!(memo.generated);
        assert_eq!(memo.text, "# Memo\nBuy.");

        let seen = writer.generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].system, SYSTEM_PROMPT);
        assert_eq!(seen[0].temperature, 0.7);
        assert_eq!(seen[0].max_tokens, 2000);
        assert!(seen[0].prompt.contains("## Company: MSFT"));
    }

    #[test]
    fn test_sampling_settings_reach_the_request() {
        let writer = MemoWriter::new(Canned::new(Ok(String::new())))
            .with_temperature(0.2)
            .with_max_tokens(800);
        let request = writer.request_for(&summary());
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, 800);
    }

    #[tokio::test]
    async fn test_auth_failure_becomes_text() {
        let writer = MemoWriter::new(Canned::new(Err(GenerationError::Authentication(
            "401".into(),
        ))));
        let memo = writer.write(&summary()).await;
        assert!(!memo.generated);
        assert_eq!(memo.text, "ERROR: Invalid API key. Check your .env file.");
    }

    #[tokio::test]
    async fn test_blank_reply_is_a_failure() {
        let writer = MemoWriter::new(Canned::new(Ok("  \n".into())));
        let memo = writer.write(&summary()).await;
        assert!(!memo.generated);
        assert_eq!(memo.text, "ERROR: model returned no text");
    }

    #[test]
    fn test_describe_failure_variants() {
        assert_eq!(
            describe_failure(&GenerationError::RateLimited("slow down".into())),
            "ERROR: Rate limit exceeded. Wait a moment and try again."
        );
        assert_eq!(
            describe_failure(&GenerationError::Api {
                status: 500,
                message: "boom".into()
            }),
            "ERROR: API error (HTTP 500): boom"
        );
        assert_eq!(
            describe_failure(&GenerationError::NotConfigured("OPENAI_API_KEY is not set".into())),
            "ERROR: not configured: OPENAI_API_KEY is not set"
        );
    }
}
