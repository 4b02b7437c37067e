use crate::config::AppConfig;
use crate::error::Result;
use crate::models::{DataKind, Series};
use crate::providers::{Deadline, ProviderChain};
use chrono::Duration;
use tracing::{debug, info};

use super::cache_store::CacheStore;
use super::trading_calendar::beijing_today;

/// Cache-first data acquisition for one symbol
///
/// The single entry point used by scoring: consult the cache, fetch the
/// missing tail through the provider chain, merge, and hand back the full
/// series. On total vendor failure the error propagates — callers record
/// the failure, nothing is fabricated.
pub struct Acquirer {
    config: AppConfig,
    cache: CacheStore,
    chain: ProviderChain,
}

impl Acquirer {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let chain = ProviderChain::new(config)?;
        Ok(Self::with_chain(config, chain))
    }

    /// Build with an explicit provider chain (tests, custom vendor order)
    pub fn with_chain(config: &AppConfig, chain: ProviderChain) -> Self {
        Self {
            config: config.clone(),
            cache: CacheStore::new(config),
            chain,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Get the series for a symbol, fetching only what the cache lacks.
    ///
    /// 1. If the newest cached row is within the freshness window of the
    ///    exchange-local day, return the cache unchanged — no network.
    /// 2. Otherwise resolve `since = last cached date + 1 day` (no lower
    ///    bound when the cache is absent) through the provider chain.
    /// 3. Merge-and-save, return the full merged series.
    pub async fn get(&self, symbol: &str, kind: DataKind) -> Result<Series> {
        let today = beijing_today();
        let cached = self
            .cache
            .load(symbol, kind, self.config.cache_max_age_days);

        if let Some(series) = &cached {
            if let Some(last) = series.last() {
                let age_days = (today - last.date).num_days();
                if age_days < self.config.freshness_days {
                    debug!(symbol, kind = %kind, last_date = %last.date, "Cache is fresh, skipping network");
                    return Ok(series.clone());
                }
            }
        }

        let since = cached
            .as_ref()
            .and_then(|series| series.last())
            .map(|bar| bar.date + Duration::days(1));

        let deadline = Deadline::after(self.config.symbol_deadline);
        let fetched = self.chain.resolve(symbol, kind, since, &deadline).await?;

        info!(
            symbol,
            kind = %kind,
            fetched = fetched.len(),
            since = ?since,
            "Fetched new rows from provider chain"
        );

        self.cache.merge_and_save(symbol, kind, &fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::Bar;
    use crate::providers::{ProviderClient, RawTable};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Provider stub returning a fixed table (or a fixed failure)
    struct StubProvider {
        result: std::result::Result<RawTable, &'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl StubProvider {
        fn ok(rows: Vec<Vec<String>>, calls: Arc<AtomicUsize>) -> Box<Self> {
            let columns = ["date", "open", "high", "low", "close", "volume"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            Box::new(Self {
                result: Ok(RawTable::new(columns, rows)),
                calls,
            })
        }

        fn failing(error: &'static str, calls: Arc<AtomicUsize>) -> Box<Self> {
            Box::new(Self {
                result: Err(error),
                calls,
            })
        }
    }

    #[async_trait]
    impl ProviderClient for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn fetch(
            &self,
            _symbol: &str,
            _kind: DataKind,
            _since: Option<NaiveDate>,
        ) -> Result<RawTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(table) => Ok(table.clone()),
                Err(msg) => Err(Error::VendorUnavailable(msg.to_string())),
            }
        }
    }

    fn config(dir: &TempDir) -> AppConfig {
        AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        }
    }

    fn row(date: NaiveDate, close: f64) -> Vec<String> {
        vec![
            date.format("%Y-%m-%d").to_string(),
            format!("{}", close),
            format!("{}", close * 1.01),
            format!("{}", close * 0.99),
            format!("{}", close),
            "1000".to_string(),
        ]
    }

    fn seed_cache(config: &AppConfig, symbol: &str, dates: &[NaiveDate]) {
        let store = CacheStore::new(config);
        let bars: Vec<Bar> = dates
            .iter()
            .map(|d| Bar::new(*d, 1.0, 1.1, 0.9, 1.0, 1000.0))
            .collect();
        store.merge_and_save(symbol, DataKind::Daily, &bars).unwrap();
    }

    #[tokio::test]
    async fn test_incremental_fetch_appends_missing_day() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let today = beijing_today();

        // Cache: 10 days ending yesterday
        let cached_dates: Vec<NaiveDate> =
            (1..=10).rev().map(|i| today - Duration::days(i)).collect();
        seed_cache(&config, "510050", &cached_dates);

        let calls = Arc::new(AtomicUsize::new(0));
        let chain = ProviderChain::with_providers(vec![StubProvider::ok(
            vec![row(today, 1.2)],
            calls.clone(),
        )]);
        let acquirer = Acquirer::with_chain(&config, chain);

        let series = acquirer.get("510050", DataKind::Daily).await.unwrap();
        assert_eq!(series.len(), 11);
        assert_eq!(series.last().unwrap().date, today);
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let today = beijing_today();

        let cached_dates: Vec<NaiveDate> =
            (0..5).rev().map(|i| today - Duration::days(i)).collect();
        seed_cache(&config, "510300", &cached_dates);

        let calls = Arc::new(AtomicUsize::new(0));
        let chain = ProviderChain::with_providers(vec![StubProvider::ok(
            vec![row(today, 9.9)],
            calls.clone(),
        )]);
        let acquirer = Acquirer::with_chain(&config, chain);

        let series = acquirer.get("510300", DataKind::Daily).await.unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_providers_fail_returns_unavailable() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let calls = Arc::new(AtomicUsize::new(0));
        let chain = ProviderChain::with_providers(vec![
            StubProvider::failing("timeout", calls.clone()),
            StubProvider::failing("HTTP 502", calls.clone()),
        ]);
        let acquirer = Acquirer::with_chain(&config, chain);

        match acquirer.get("159995", DataKind::Daily).await {
            Err(Error::Unavailable(_)) => {}
            other => panic!("expected Unavailable, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Nothing was written to the cache
        assert!(acquirer.cache().load("159995", DataKind::Daily, 365).is_none());
    }

    #[tokio::test]
    async fn test_chain_falls_through_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let today = beijing_today();

        // First two vendors return malformed tables, the third is valid
        let calls = Arc::new(AtomicUsize::new(0));
        let bad_columns: Vec<String> =
            ["date", "open"].iter().map(|s| s.to_string()).collect();
        let bad = Box::new(StubProvider {
            result: Ok(RawTable::new(bad_columns.clone(), vec![])),
            calls: calls.clone(),
        });
        let bad2 = Box::new(StubProvider {
            result: Ok(RawTable::new(bad_columns, vec![])),
            calls: calls.clone(),
        });
        let rows: Vec<Vec<String>> = (0..30)
            .rev()
            .map(|i| row(today - Duration::days(i + 1), 1.0))
            .collect();
        let good = StubProvider::ok(rows, calls.clone());

        let chain = ProviderChain::with_providers(vec![bad, bad2, good]);
        let acquirer = Acquirer::with_chain(&config, chain);

        let series = acquirer.get("512880", DataKind::Daily).await.unwrap();
        assert_eq!(series.len(), 30);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
