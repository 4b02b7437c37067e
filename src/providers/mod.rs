//! Vendor data sources and the provider fallback chain
//!
//! Each vendor adapter returns a [`RawTable`] keeping its own column
//! names; the chain normalizes those against the canonical bar schema and
//! tries the next vendor on any failure. The chain never touches the
//! cache and never synthesizes data: exhausting every vendor surfaces as
//! [`AppError::Unavailable`](crate::error::AppError).

mod eastmoney;
mod http;
mod sina;
mod tencent;

pub use eastmoney::EastmoneyClient;
pub use http::HttpFetcher;
pub use sina::{Holding, SinaClient};
pub use tencent::TencentClient;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::{Bar, DataKind, Series};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Column-name variants accepted for each canonical bar field
const DATE_COLUMNS: &[&str] = &["date", "day", "日期"];
const OPEN_COLUMNS: &[&str] = &["open", "开盘", "开盘价"];
const HIGH_COLUMNS: &[&str] = &["high", "最高", "最高价"];
const LOW_COLUMNS: &[&str] = &["low", "最低", "最低价"];
const CLOSE_COLUMNS: &[&str] = &["close", "收盘", "收盘价"];
const VOLUME_COLUMNS: &[&str] = &["volume", "vol", "成交量", "成交额"];

/// Tabular vendor payload with the vendor's own column names
#[derive(Debug, Clone)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }
}

/// One external data vendor
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch bars for a symbol, optionally bounded below by `since`
    async fn fetch(
        &self,
        symbol: &str,
        kind: DataKind,
        since: Option<NaiveDate>,
    ) -> Result<RawTable>;
}

/// Monotonic time budget threaded through an acquisition so a stuck
/// vendor cannot stall a whole batch.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// No time limit
    pub fn none() -> Self {
        Self { expires_at: None }
    }

    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Some(Instant::now() + budget),
        }
    }

    pub fn expired(&self) -> bool {
        self.expires_at.is_some_and(|t| Instant::now() >= t)
    }
}

/// Ordered fallback list of vendors queried until one yields valid data
pub struct ProviderChain {
    providers: Vec<Box<dyn ProviderClient>>,
}

impl ProviderChain {
    /// Build the default vendor order sharing one HTTP client
    pub fn new(config: &AppConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.request_timeout, config.max_retries)?);

        Ok(Self {
            providers: vec![
                Box::new(EastmoneyClient::new(fetcher.clone())),
                Box::new(SinaClient::new(fetcher.clone())),
                Box::new(TencentClient::new(fetcher)),
            ],
        })
    }

    /// Build a chain over an explicit provider list (tests, custom order)
    pub fn with_providers(providers: Vec<Box<dyn ProviderClient>>) -> Self {
        Self { providers }
    }

    /// Try each provider in priority order until one returns a non-empty,
    /// schema-valid series. Failures are logged with their kind and the
    /// chain advances; exhaustion returns `Unavailable`.
    pub async fn resolve(
        &self,
        symbol: &str,
        kind: DataKind,
        since: Option<NaiveDate>,
        deadline: &Deadline,
    ) -> Result<Series> {
        let mut last_error = String::from("no providers configured");

        for provider in &self.providers {
            if deadline.expired() {
                warn!(symbol, "Acquisition deadline exceeded, aborting provider chain");
                return Err(Error::Unavailable(format!(
                    "{}: deadline exceeded ({})",
                    symbol, last_error
                )));
            }

            let table = match provider.fetch(symbol, kind, since).await {
                Ok(table) => table,
                Err(e @ Error::VendorUnavailable(_)) => {
                    warn!(symbol, vendor = provider.name(), error = %e, "Vendor unavailable");
                    last_error = e.to_string();
                    continue;
                }
                Err(e @ Error::SchemaMismatch(_)) => {
                    warn!(symbol, vendor = provider.name(), error = %e, "Vendor schema mismatch");
                    last_error = e.to_string();
                    continue;
                }
                Err(e) => {
                    warn!(symbol, vendor = provider.name(), error = %e, "Vendor fetch failed");
                    last_error = e.to_string();
                    continue;
                }
            };

            match normalize_table(&table, since) {
                Ok(series) if series.is_empty() => {
                    warn!(symbol, vendor = provider.name(), "Vendor returned empty data");
                    last_error = format!("{}: empty data", provider.name());
                }
                Ok(series) => {
                    debug!(
                        symbol,
                        vendor = provider.name(),
                        rows = series.len(),
                        "Resolved series from vendor"
                    );
                    return Ok(series);
                }
                Err(e) => {
                    warn!(symbol, vendor = provider.name(), error = %e, "Vendor schema mismatch");
                    last_error = e.to_string();
                }
            }
        }

        Err(Error::Unavailable(format!("{}: {}", symbol, last_error)))
    }
}

/// Validate a vendor table against the canonical column contract and
/// convert it into a sorted, deduplicated series.
///
/// Rows that fail to parse are skipped; a table with a missing column or
/// no parseable row at all is a schema mismatch.
pub fn normalize_table(table: &RawTable, since: Option<NaiveDate>) -> Result<Series> {
    let date_idx = find_column(&table.columns, DATE_COLUMNS)
        .ok_or_else(|| missing_column("date", &table.columns))?;
    let open_idx = find_column(&table.columns, OPEN_COLUMNS)
        .ok_or_else(|| missing_column("open", &table.columns))?;
    let high_idx = find_column(&table.columns, HIGH_COLUMNS)
        .ok_or_else(|| missing_column("high", &table.columns))?;
    let low_idx = find_column(&table.columns, LOW_COLUMNS)
        .ok_or_else(|| missing_column("low", &table.columns))?;
    let close_idx = find_column(&table.columns, CLOSE_COLUMNS)
        .ok_or_else(|| missing_column("close", &table.columns))?;
    let volume_idx = find_column(&table.columns, VOLUME_COLUMNS)
        .ok_or_else(|| missing_column("volume", &table.columns))?;

    let mut bars: Vec<Bar> = Vec::with_capacity(table.rows.len());
    let mut skipped = 0usize;

    for row in &table.rows {
        match parse_row(row, date_idx, open_idx, high_idx, low_idx, close_idx, volume_idx) {
            Some(bar) => bars.push(bar),
            None => skipped += 1,
        }
    }

    if bars.is_empty() && !table.rows.is_empty() {
        return Err(Error::SchemaMismatch(format!(
            "no parseable rows out of {}",
            table.rows.len()
        )));
    }

    if skipped > 0 {
        debug!(skipped, total = table.rows.len(), "Skipped unparseable vendor rows");
    }

    // Sort ascending, keep the last occurrence per date
    bars.sort_by_key(|b| b.date);
    bars.reverse();
    let mut seen = std::collections::HashSet::new();
    bars.retain(|b| seen.insert(b.date));
    bars.reverse();

    if let Some(since) = since {
        bars.retain(|b| b.date >= since);
    }

    Ok(bars)
}

fn parse_row(
    row: &[String],
    date_idx: usize,
    open_idx: usize,
    high_idx: usize,
    low_idx: usize,
    close_idx: usize,
    volume_idx: usize,
) -> Option<Bar> {
    let date = parse_date(row.get(date_idx)?)?;
    let open = parse_number(row.get(open_idx)?)?;
    let high = parse_number(row.get(high_idx)?)?;
    let low = parse_number(row.get(low_idx)?)?;
    let close = parse_number(row.get(close_idx)?)?;
    let volume = parse_number(row.get(volume_idx)?)?;

    if open <= 0.0 || high <= 0.0 || low <= 0.0 || close <= 0.0 || volume < 0.0 {
        return None;
    }

    Some(Bar::new(date, open, high, low, close, volume))
}

fn find_column(columns: &[String], variants: &[&str]) -> Option<usize> {
    columns.iter().position(|c| {
        let c = c.trim();
        variants
            .iter()
            .any(|v| c.eq_ignore_ascii_case(v) || c == *v)
    })
}

fn missing_column(field: &str, columns: &[String]) -> Error {
    Error::SchemaMismatch(format!(
        "missing {} column (got: {})",
        field,
        columns.join(",")
    ))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // Datetime strings keep only the date part
    let date_part = s.split(&[' ', 'T'][..]).next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y%m%d"))
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y/%m/%d"))
        .ok()
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().replace(',', "").parse::<f64>().ok()
}

/// Strip an exchange prefix (`sh.`/`sz.`) from a symbol
pub(crate) fn pure_code(symbol: &str) -> &str {
    symbol
        .strip_prefix("sh.")
        .or_else(|| symbol.strip_prefix("sz."))
        .unwrap_or(symbol)
}

/// Exchange prefix for a bare fund code: Shanghai for `5xxxxx`, Shenzhen
/// otherwise
pub(crate) fn exchange_prefix(code: &str) -> &'static str {
    if code.starts_with('5') {
        "sh"
    } else {
        "sz"
    }
}
