use anyhow::{bail, Context};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use fundamentals_core::statements::{Period, StatementKind, StatementStore, StatementTable};

use super::{CompanyProfile, StatementProvider};

/// Raw statements cached as `{dir}/{TICKER}_{statement}.csv`, with the
/// company profile beside them as `{dir}/{TICKER}_info.json`.
///
/// The layout is the one pandas writes for a yfinance statement frame: a
/// header row of period dates behind an empty corner cell, then one row per
/// line item with blank or `NaN` cells where nothing was reported.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &str, kind: StatementKind) -> PathBuf {
        self.dir.join(format!("{}_{}.csv", ticker, kind.file_stem()))
    }

    pub fn profile_path(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}_info.json"))
    }

    pub fn load(&self, ticker: &str) -> anyhow::Result<StatementStore> {
        let table = |kind| {
            let path = self.path_for(ticker, kind);
            read_table(&path, kind).with_context(|| {
                format!(
                    "Could not load {kind} for {ticker} from {}; run `fundamentals collect {ticker}` first",
                    path.display()
                )
            })
        };
        let store = StatementStore::new(
            table(StatementKind::IncomeStatement)?,
            table(StatementKind::BalanceSheet)?,
            table(StatementKind::CashFlow)?,
        )?;
        Ok(store)
    }

    /// Write all three tables, creating the directory if needed.
    pub fn save(&self, ticker: &str, store: &StatementStore) -> anyhow::Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create '{}'", self.dir.display()))?;

        let mut written = Vec::new();
        for table in store.tables() {
            let path = self.path_for(ticker, table.kind());
            write_table(&path, table)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            tracing::debug!(path = %path.display(), rows = table.rows().len(), "saved statement");
            written.push(path);
        }
        Ok(written)
    }

    /// The cached profile, or `None` when none was saved.
    pub fn load_profile(&self, ticker: &str) -> anyhow::Result<Option<CompanyProfile>> {
        let path = self.profile_path(ticker);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let profile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse '{}'", path.display()))?;
        Ok(Some(profile))
    }

    pub fn save_profile(&self, ticker: &str, profile: &CompanyProfile) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create '{}'", self.dir.display()))?;
        let path = self.profile_path(ticker);
        fs::write(&path, serde_json::to_string_pretty(profile)?)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        Ok(path)
    }
}

#[async_trait]
impl StatementProvider for CsvDirectory {
    fn name(&self) -> &str {
        "csv"
    }

    async fn statements(&self, ticker: &str) -> anyhow::Result<StatementStore> {
        self.load(ticker)
    }

    async fn profile(&self, ticker: &str) -> anyhow::Result<Option<CompanyProfile>> {
        self.load_profile(ticker)
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn read_table(path: &Path, kind: StatementKind) -> anyhow::Result<StatementTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => bail!("'{}' is empty", path.display()),
    };
    let periods: Vec<Period> = header
        .iter()
        .skip(1)
        .map(|label| Period::new(label.trim()))
        .collect();

    let mut table = StatementTable::new(kind, periods);
    for (line, record) in records.enumerate() {
        let record = record?;
        let mut cells = record.iter();
        let label = cells.next().unwrap_or_default().trim();
        if label.is_empty() {
            continue;
        }
        let mut values = cells
            .map(parse_cell)
            .collect::<anyhow::Result<Vec<_>>>()
            .with_context(|| format!("row {} ({label})", line + 2))?;
        if values.len() > table.period_count() {
            bail!(
                "row {} ({label}) has {} value(s) but the header names {} period(s)",
                line + 2,
                values.len(),
                table.period_count()
            );
        }
        // pandas drops trailing empty cells on some exports
        values.resize(table.period_count(), None);
        table.push_row(label, values)?;
    }
    Ok(table)
}

fn parse_cell(cell: &str) -> anyhow::Result<Option<Decimal>> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value = Decimal::from_str(cell)
        .or_else(|_| Decimal::from_scientific(&cell.replace("e+", "e").replace("E+", "E")))
        .with_context(|| format!("'{cell}' is not a number"))?;
    Ok(Some(value))
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn write_table(path: &Path, table: &StatementTable) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![String::new()];
    header.extend(table.periods().iter().map(|p| p.label.clone()));
    writer.write_record(&header)?;

    for row in table.rows() {
        let mut record = vec![row.label.clone()];
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|d| d.normalize().to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
