use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fundamentals_core::analysis::format_metric_value;

/// Headline facts about a company, shown beside its statements and cached
/// as `{TICKER}_info.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<Decimal>,
    pub current_price: Option<Decimal>,
    pub pe_ratio: Option<Decimal>,
    pub eps: Option<Decimal>,
    pub revenue: Option<Decimal>,
    pub employees: Option<u64>,
}

impl CompanyProfile {
    /// Reported fields as `(name, value)` rows; absent fields are skipped.
    pub fn summary_rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = Vec::new();

        for (name, text) in [
            ("Company", &self.company),
            ("Sector", &self.sector),
            ("Industry", &self.industry),
        ] {
            if let Some(text) = text {
                rows.push((name, text.clone()));
            }
        }
        for (name, amount) in [
            ("Market Cap", self.market_cap),
            ("Current Price", self.current_price),
            ("P/E Ratio", self.pe_ratio),
            ("EPS", self.eps),
            ("Revenue", self.revenue),
        ] {
            if let Some(amount) = amount {
                rows.push((name, format_metric_value(amount)));
            }
        }
        if let Some(employees) = self.employees {
            rows.push(("Employees", employees.to_string()));
        }
        rows
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
