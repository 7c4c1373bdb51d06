//! One-shot composition of every metric group into the summary handed to
//! memo generation and persistence.

pub mod sections;
pub mod summary;

pub use sections::{format_metric_value, SectionView};
pub use summary::{analyze, AnalysisSummary};
