use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use fundamentals_core::statements::{Period, StatementKind, StatementStore, StatementTable};

use super::{CompanyProfile, StatementProvider};

const BASE_URL: &str = "https://query2.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";
/// Earliest timestamp yfinance asks the timeseries endpoint for.
const HISTORY_START: i64 = 493_590_046;
const MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
const PROFILE_MODULES: &str = "assetProfile,price,summaryDetail,defaultKeyStatistics,financialData";

const INCOME_SERIES: &[&str] = &[
    "TotalRevenue",
    "CostOfRevenue",
    "GrossProfit",
    "OperatingExpense",
    "OperatingIncome",
    "EBITDA",
    "InterestExpense",
    "PretaxIncome",
    "TaxProvision",
    "NetIncome",
    "BasicEPS",
    "DilutedEPS",
];

const BALANCE_SERIES: &[&str] = &[
    "TotalAssets",
    "CurrentAssets",
    "CashAndCashEquivalents",
    "TotalLiabilitiesNetMinorityInterest",
    "CurrentLiabilities",
    "LongTermDebt",
    "TotalDebt",
    "StockholdersEquity",
    "RetainedEarnings",
];

const CASHFLOW_SERIES: &[&str] = &[
    "OperatingCashFlow",
    "CapitalExpenditure",
    "FreeCashFlow",
    "DepreciationAndAmortization",
    "InvestingCashFlow",
    "FinancingCashFlow",
    "RepurchaseOfCapitalStock",
    "CashDividendsPaid",
];

fn series_for(kind: StatementKind) -> &'static [&'static str] {
    match kind {
        StatementKind::IncomeStatement => INCOME_SERIES,
        StatementKind::BalanceSheet => BALANCE_SERIES,
        StatementKind::CashFlow => CASHFLOW_SERIES,
    }
}

/// Value of the `type` query parameter for one statement.
fn series_types(kind: StatementKind) -> String {
    series_for(kind)
        .iter()
        .map(|key| format!("annual{key}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Annual statements and the company profile from Yahoo Finance.
#[derive(Clone)]
pub struct YahooProvider {
    client: Client,
    base_url: String,
    cookie_url: String,
    retry_delay: Duration,
}

impl YahooProvider {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_urls(BASE_URL, COOKIE_URL)
    }

    /// Send every request, session handshake included, to `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let base_url = base_url.into();
        Self::with_urls(base_url.clone(), base_url)
    }

    fn with_urls(base_url: impl Into<String>, cookie_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .cookie_store(true)
            .build()
            .context("Failed to build the Yahoo Finance HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie_url: cookie_url.into(),
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Pause before the next attempt; `None` once the attempts are used up.
    fn retry_wait(&self, attempt: u32) -> Option<Duration> {
        (attempt < MAX_ATTEMPTS).then_some(self.retry_delay)
    }

    /// GET with automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> anyhow::Result<reqwest::Response> {
        let request = builder.build()?;

        for attempt in 1..=MAX_ATTEMPTS {
            let req_clone = request
                .try_clone()
                .context("Cannot clone Yahoo Finance request")?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .context("Yahoo Finance request failed")?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            let Some(delay) = self.retry_wait(attempt) else {
                break;
            };
            tracing::warn!(
                "Yahoo Finance 429 rate limited, waiting {:.1}s before retry {}/{}",
                delay.as_secs_f64(),
                attempt + 1,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(delay).await;
        }

        bail!("Rate limited by Yahoo Finance after {MAX_ATTEMPTS} attempts")
    }

    /// Session crumb that quoteSummary calls carry. `None` when Yahoo refuses
    /// the handshake; the call is then made without one.
    async fn crumb(&self) -> Option<String> {
        // The cookie host sets the session cookie on any response, 404 included
        if let Err(e) = self.client.get(&self.cookie_url).send().await {
            tracing::debug!(error = %e, "Yahoo Finance cookie request failed");
        }
        let url = format!("{}/v1/test/getcrumb", self.base_url);
        let response = self.send_request(self.client.get(&url)).await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let crumb = response.text().await.ok()?.trim().to_string();
        (!crumb.is_empty()).then_some(crumb)
    }

    async fn fetch_profile(&self, ticker: &str) -> anyhow::Result<CompanyProfile> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker);
        let mut request = self.client.get(&url).query(&[("modules", PROFILE_MODULES)]);
        if let Some(crumb) = self.crumb().await {
            request = request.query(&[("crumb", crumb.as_str())]);
        }

        let response = self.send_request(request).await?;
        let status = response.status();
        if !status.is_success() {
            bail!(
                "Yahoo Finance returned HTTP {} for the {} profile: {}",
                status,
                ticker,
                response.text().await.unwrap_or_default()
            );
        }

        let body: QuoteSummaryResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse the Yahoo Finance profile for {ticker}"))?;
        if let Some(error) = body.quote_summary.error {
            bail!("Yahoo Finance error for {ticker}: {error}");
        }
        let Some(modules) = body.quote_summary.result.unwrap_or_default().into_iter().next() else {
            bail!("Yahoo Finance has no profile for '{ticker}'");
        };
        Ok(modules.into_profile())
    }

    async fn fetch_table(&self, ticker: &str, kind: StatementKind) -> anyhow::Result<StatementTable> {
        let url = format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}",
            self.base_url, ticker
        );
        let period1 = HISTORY_START.to_string();
        let period2 = chrono::Utc::now().timestamp().to_string();
        let types = series_types(kind);

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("symbol", ticker),
                ("type", types.as_str()),
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
            ]))
            .await?;

        let status = response.status();
        if !status.is_success() {
            bail!(
                "Yahoo Finance returned HTTP {} for {} {}: {}",
                status,
                ticker,
                kind,
                response.text().await.unwrap_or_default()
            );
        }

        let body: TimeseriesResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse Yahoo Finance {kind} for {ticker}"))?;
        if let Some(error) = body.timeseries.error {
            bail!("Yahoo Finance error for {ticker}: {error}");
        }

        let table = build_table(kind, body.timeseries.result.unwrap_or_default())?;
        tracing::debug!(
            ticker,
            statement = %kind,
            periods = table.period_count(),
            rows = table.rows().len(),
            "fetched statement"
        );
        Ok(table)
    }
}

#[async_trait]
impl StatementProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn statements(&self, ticker: &str) -> anyhow::Result<StatementStore> {
        let income = self.fetch_table(ticker, StatementKind::IncomeStatement).await?;
        let balance = self.fetch_table(ticker, StatementKind::BalanceSheet).await?;
        let cashflow = self.fetch_table(ticker, StatementKind::CashFlow).await?;

        if income.rows().is_empty() && balance.rows().is_empty() && cashflow.rows().is_empty() {
            bail!("Yahoo Finance has no financial statements for '{ticker}'");
        }
        Ok(StatementStore::new(income, balance, cashflow)?)
    }

    async fn profile(&self, ticker: &str) -> anyhow::Result<Option<CompanyProfile>> {
        self.fetch_profile(ticker).await.map(Some)
    }
}

// ---------------------------------------------------------------------------
// Response shaping
// ---------------------------------------------------------------------------

/// Pivot the per-series observations into a statement table: one row per
/// series that reported anything, one column per fiscal year end.
fn build_table(kind: StatementKind, results: Vec<SeriesResult>) -> anyhow::Result<StatementTable> {
    let mut by_key: HashMap<String, HashMap<String, Decimal>> = HashMap::new();
    let mut dates: BTreeSet<String> = BTreeSet::new();

    for mut result in results {
        let Some(series_type) = result.meta.kinds.first().cloned() else {
            continue;
        };
        let Some(raw) = result.series.remove(&series_type) else {
            continue;
        };
        let observations: Vec<Option<Observation>> = serde_json::from_value(raw)
            .with_context(|| format!("Unexpected shape for series '{series_type}'"))?;

        let key = series_type.trim_start_matches("annual").to_string();
        let cells = by_key.entry(key).or_default();
        for obs in observations.into_iter().flatten() {
            let Some(value) = obs.reported_value.and_then(|v| Decimal::from_f64(v.raw)) else {
                continue;
            };
            dates.insert(obs.as_of_date.clone());
            cells.insert(obs.as_of_date, value);
        }
    }

    let dates: Vec<String> = dates.into_iter().rev().collect();
    let periods = dates.iter().map(|d| Period::new(d.as_str())).collect();
    let mut table = StatementTable::new(kind, periods);

    for key in series_for(kind) {
        let Some(cells) = by_key.get(*key).filter(|c| !c.is_empty()) else {
            continue;
        };
        let values = dates.iter().map(|d| cells.get(d).copied()).collect();
        table.push_row(series_label(key), values)?;
    }
    Ok(table)
}

/// "TotalRevenue" -> "Total Revenue", "BasicEPS" -> "Basic EPS".
fn series_label(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut label = String::with_capacity(key.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || (prev.is_ascii_uppercase() && next_lower) {
                label.push(' ');
            }
        }
        label.push(c);
    }
    label
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: Timeseries,
}

#[derive(Debug, Deserialize)]
struct Timeseries {
    #[serde(default)]
    result: Option<Vec<SeriesResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SeriesResult {
    meta: SeriesMeta,
    #[serde(flatten)]
    series: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SeriesMeta {
    #[serde(rename = "type", default)]
    kinds: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Observation {
    as_of_date: String,
    reported_value: Option<ReportedValue>,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    raw: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<QuoteModules>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QuoteModules {
    asset_profile: Option<AssetProfile>,
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
    financial_data: Option<FinancialData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    full_time_employees: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    market_cap: Option<QuoteValue>,
    regular_market_price: Option<QuoteValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<QuoteValue>,
    #[serde(rename = "marketCap")]
    market_cap: Option<QuoteValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatistics {
    trailing_eps: Option<QuoteValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialData {
    current_price: Option<QuoteValue>,
    total_revenue: Option<QuoteValue>,
}

/// `{"raw": 1.5, "fmt": "1.50"}`, or `{}` when Yahoo has no figure.
#[derive(Debug, Default, Deserialize)]
struct QuoteValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn amount(value: &Option<QuoteValue>) -> Option<Decimal> {
    value.as_ref()?.raw.and_then(Decimal::from_f64)
}

impl QuoteModules {
    fn into_profile(self) -> CompanyProfile {
        let asset = self.asset_profile.unwrap_or_default();
        let price = self.price.unwrap_or_default();
        let detail = self.summary_detail.unwrap_or_default();
        let stats = self.default_key_statistics.unwrap_or_default();
        let financial = self.financial_data.unwrap_or_default();

        CompanyProfile {
            company: price.long_name.or(price.short_name),
            sector: asset.sector,
            industry: asset.industry,
            market_cap: amount(&price.market_cap).or_else(|| amount(&detail.market_cap)),
            current_price: amount(&financial.current_price)
                .or_else(|| amount(&price.regular_market_price)),
            pe_ratio: amount(&detail.trailing_pe),
            eps: amount(&stats.trailing_eps),
            revenue: amount(&financial.total_revenue),
            employees: asset.full_time_employees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundamentals_core::statements::LineItem;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "/ws/fundamentals-timeseries/v1/finance/timeseries/AAPL";

    fn obs(date: &str, raw: f64) -> serde_json::Value {
        json!({
            "asOfDate": date,
            "periodType": "12M",
            "currencyCode": "USD",
            "reportedValue": { "raw": raw, "fmt": "" }
        })
    }

    fn series(key: &str, points: Vec<serde_json::Value>) -> serde_json::Value {
        let mut entry = json!({
            "meta": { "symbol": ["AAPL"], "type": [key] },
            "timestamp": [1]
        });
        entry[key] = serde_json::Value::Array(points);
        entry
    }

    fn body(results: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "timeseries": { "result": results, "error": null } })
    }

    async fn mount(server: &MockServer, kind: StatementKind, results: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .and(query_param("type", series_types(kind)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(results)))
            .mount(server)
            .await;
    }

    #[test]
    fn test_series_label() {
        assert_eq!(series_label("TotalRevenue"), "Total Revenue");
        assert_eq!(series_label("BasicEPS"), "Basic EPS");
        assert_eq!(series_label("EBITDA"), "EBITDA");
        assert_eq!(
            series_label("TotalLiabilitiesNetMinorityInterest"),
            "Total Liabilities Net Minority Interest"
        );
        for item in LineItem::ALL {
            let key: String = item.label().split(' ').collect();
            assert_eq!(series_label(&key), item.label());
        }
    }

    #[tokio::test]
    async fn test_statements_pivoted_most_recent_first() {
        let server = MockServer::start().await;
        mount(
            &server,
            StatementKind::IncomeStatement,
            vec![
                series(
                    "annualTotalRevenue",
                    vec![
                        obs("2022-09-30", 394328000000.0),
                        serde_json::Value::Null,
                        obs("2024-09-30", 391035000000.0),
                        obs("2023-09-30", 383285000000.0),
                    ],
                ),
                series("annualNetIncome", vec![obs("2024-09-30", 93736000000.0)]),
                series("annualBasicEPS", vec![]),
            ],
        )
        .await;
        mount(
            &server,
            StatementKind::BalanceSheet,
            vec![series("annualTotalAssets", vec![obs("2024-09-30", 364980000000.0)])],
        )
        .await;
        mount(
            &server,
            StatementKind::CashFlow,
            vec![series("annualFreeCashFlow", vec![obs("2024-09-30", 108807000000.0)])],
        )
        .await;

        let provider = YahooProvider::with_base_url(server.uri()).unwrap();
        let store = provider.statements("AAPL").await.unwrap();

        let income = store.income_statement();
        let labels: Vec<&str> = income.periods().iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-09-30", "2023-09-30", "2022-09-30"]);
        assert_eq!(income.labels(), vec!["Total Revenue", "Net Income"]);
        assert_eq!(
            income.lookup(LineItem::TotalRevenue, 1).unwrap(),
            dec!(383285000000)
        );
        assert_eq!(income.row("Net Income").unwrap().values[2], None);
        assert_eq!(
            store.cash_flow().lookup(LineItem::FreeCashFlow, 0).unwrap(),
            dec!(108807000000)
        );
    }

    #[tokio::test]
    async fn test_retries_after_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        for kind in StatementKind::ALL {
            mount(
                &server,
                kind,
                vec![series("annualTotalRevenue", vec![obs("2024-09-30", 1.0)])],
            )
            .await;
        }

        let provider =
            YahooProvider::with_base_url(server.uri())
                .unwrap()
                .with_retry_delay(Duration::from_millis(1));
        assert!(provider.statements("AAPL").await.is_ok());
    }

    #[tokio::test]
    async fn test_gives_up_after_three_rate_limits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let provider =
            YahooProvider::with_base_url(server.uri())
                .unwrap()
                .with_retry_delay(Duration::from_millis(1));
        let err = provider.statements("AAPL").await.unwrap_err();
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(vec![])))
            .mount(&server)
            .await;

        let err = YahooProvider::with_base_url(server.uri())
            .unwrap()
            .statements("AAPL")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no financial statements"));
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = YahooProvider::with_base_url(server.uri())
            .unwrap()
            .statements("AAPL")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn test_no_wait_after_last_attempt() {
        let provider = YahooProvider::with_base_url("http://127.0.0.1:1")
            .unwrap()
            .with_retry_delay(Duration::from_secs(7));
        assert_eq!(provider.retry_wait(1), Some(Duration::from_secs(7)));
        assert_eq!(provider.retry_wait(MAX_ATTEMPTS - 1), Some(Duration::from_secs(7)));
        assert_eq!(provider.retry_wait(MAX_ATTEMPTS), None);
    }

    #[tokio::test]
    async fn test_profile_from_quote_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/test/getcrumb"))
            .respond_with(ResponseTemplate::new(200).set_body_string("abc123"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/AAPL"))
            .and(query_param("modules", PROFILE_MODULES))
            .and(query_param("crumb", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "quoteSummary": {
                    "result": [{
                        "assetProfile": {
                            "sector": "Technology",
                            "industry": "Consumer Electronics",
                            "fullTimeEmployees": 164000
                        },
                        "price": {
                            "longName": "Apple Inc.",
                            "marketCap": { "raw": 3450000000000.0, "fmt": "3.45T" }
                        },
                        "summaryDetail": { "trailingPE": { "raw": 37.5, "fmt": "37.50" } },
                        "defaultKeyStatistics": { "trailingEps": {} },
                        "financialData": {
                            "currentPrice": { "raw": 227.5, "fmt": "227.50" },
                            "totalRevenue": { "raw": 391035000000.0, "fmt": "391.04B" }
                        }
                    }],
                    "error": null
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let profile = YahooProvider::with_base_url(server.uri())
            .unwrap()
            .profile("AAPL")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(profile.company.as_deref(), Some("Apple Inc."));
        assert_eq!(profile.industry.as_deref(), Some("Consumer Electronics"));
        assert_eq!(profile.market_cap, Some(dec!(3450000000000)));
        assert_eq!(profile.current_price, Some(dec!(227.5)));
        assert_eq!(profile.pe_ratio, Some(dec!(37.5)));
        assert_eq!(profile.eps, None);
        assert_eq!(profile.revenue, Some(dec!(391035000000)));
        assert_eq!(profile.employees, Some(164000));
    }

    #[tokio::test]
    async fn test_profile_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/AAPL"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Crumb"))
            .mount(&server)
            .await;

        let err = YahooProvider::with_base_url(server.uri())
            .unwrap()
            .profile("AAPL")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 401"));
    }
}
