pub mod analyze;
pub mod collect;
pub mod dcf;

use anyhow::bail;

/// Upper-cased, trimmed ticker. Tickers end up in file names, so anything
/// beyond letters, digits, `.`, `-` and `^` is rejected.
pub fn normalize_ticker(raw: &str) -> anyhow::Result<String> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        bail!("Ticker must not be empty");
    }
    if !ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'))
    {
        bail!("'{raw}' is not a valid ticker symbol");
    }
    Ok(ticker)
}
