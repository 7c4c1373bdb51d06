//! Investment memo generation seam.
//!
//! The prompt is rendered here from an [`AnalysisSummary`](crate::analysis::AnalysisSummary);
//! the text itself comes from any [`TextGenerator`]. Generator failures never
//! escape [`MemoWriter::write`]: they are turned into readable error text that
//! takes the memo's place.

pub mod generator;
pub mod prompt;

pub use generator::{
    describe_failure, GenerationError, Memo, MemoRequest, MemoWriter, TextGenerator,
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
pub use prompt::{build_prompt, SYSTEM_PROMPT};
