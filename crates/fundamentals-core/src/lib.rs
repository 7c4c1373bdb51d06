pub mod analysis;
pub mod error;
pub mod math;
pub mod ratios;
pub mod statements;
pub mod time_value;
pub mod types;
pub mod valuation;

#[cfg(feature = "memo")]
pub mod memo;

pub use error::FundamentalsError;
pub use types::*;

/// Standard result type for all fundamentals operations
pub type FundamentalsResult<T> = Result<T, FundamentalsError>;
