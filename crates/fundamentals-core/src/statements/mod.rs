//! In-memory financial statements as delivered by a data provider.
//!
//! Each [`StatementTable`] is a grid of provider-labelled line items crossed
//! with reporting periods, most recent first. Labels are free text and drift
//! between tickers and providers, so every read goes through a typed lookup
//! that reports *why* a value is unavailable instead of failing loudly.

pub mod line_item;
pub mod store;
pub mod table;

pub use line_item::LineItem;
pub use store::StatementStore;
pub use table::{LineItemRow, LookupError, Period, StatementKind, StatementTable};

/// Period index of the latest reporting period.
pub const LATEST: usize = 0;

/// Period index of the reporting period before the latest.
pub const PRIOR: usize = 1;
