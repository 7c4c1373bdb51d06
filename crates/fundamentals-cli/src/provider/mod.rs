//! Where the three statements come from: Yahoo Finance over HTTP, or CSVs
//! previously saved to the data directory.

pub mod csv_dir;
pub mod profile;
pub mod yahoo;

use async_trait::async_trait;
use fundamentals_core::statements::StatementStore;

pub use csv_dir::CsvDirectory;
pub use profile::CompanyProfile;
pub use yahoo::YahooProvider;

#[async_trait]
pub trait StatementProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Income statement, balance sheet and cash flow for `ticker`, periods
    /// most recent first.
    async fn statements(&self, ticker: &str) -> anyhow::Result<StatementStore>;

    /// Company name, sector and market figures, when the source has them.
    async fn profile(&self, _ticker: &str) -> anyhow::Result<Option<CompanyProfile>> {
        Ok(None)
    }
}
