use crate::config::AppConfig;
use crate::error::Result;
use crate::models::{CrawlState, DataKind};
use tokio::time::sleep;
use tracing::{error, info};

use super::acquirer::Acquirer;
use super::status_tracker::StatusTracker;
use super::trading_calendar::{beijing_today, is_trading_day};

/// Result of one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Sequential batch crawler over the configured universe
///
/// One symbol at a time through the acquirer, with a fixed delay between
/// acquisitions to respect vendor request limits, and the status tracker
/// making the batch resumable. Returns `None` on non-trading days.
pub struct Crawler {
    config: AppConfig,
    acquirer: Acquirer,
    tracker: StatusTracker,
}

impl Crawler {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self::with_acquirer(config, Acquirer::new(config)?))
    }

    pub fn with_acquirer(config: &AppConfig, acquirer: Acquirer) -> Self {
        Self {
            config: config.clone(),
            acquirer,
            tracker: StatusTracker::new(config),
        }
    }

    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    /// Crawl daily data for the whole universe.
    ///
    /// Symbols that already succeeded on the current exchange-local day
    /// are skipped; once every tracked symbol has succeeded the status
    /// file is deleted so the next run starts clean.
    pub async fn run_daily(&self) -> Result<Option<BatchOutcome>> {
        if !is_trading_day(beijing_today()) {
            info!("Not a trading day, skipping daily crawl");
            return Ok(None);
        }

        let symbols: Vec<String> = self
            .config
            .universe
            .iter()
            .map(|i| i.code.clone())
            .collect();
        info!(symbols = symbols.len(), "Starting daily crawl");

        let outcome = self.drive(&symbols).await?;

        self.tracker.clear_if_complete()?;
        info!(
            success = outcome.success,
            failed = outcome.failed,
            skipped = outcome.skipped,
            "Daily crawl finished"
        );
        Ok(Some(outcome))
    }

    /// Resume an interrupted batch: re-drive only the pending/failed set.
    /// With no status file on disk this starts a fresh daily crawl.
    pub async fn resume(&self) -> Result<Option<BatchOutcome>> {
        if !is_trading_day(beijing_today()) {
            info!("Not a trading day, skipping resume");
            return Ok(None);
        }

        if !self.tracker.exists() {
            info!("No interrupted batch found, starting a fresh crawl");
            return self.run_daily().await;
        }

        let pending = self.tracker.pending_or_failed();
        if pending.is_empty() {
            info!("No pending symbols, batch already complete");
            self.tracker.clear_if_complete()?;
            return Ok(Some(BatchOutcome::default()));
        }

        // Only resume symbols still part of the universe
        let symbols: Vec<String> = pending
            .into_iter()
            .filter(|code| self.config.universe.iter().any(|i| &i.code == code))
            .collect();
        info!(symbols = symbols.len(), "Resuming interrupted crawl");

        let outcome = self.drive(&symbols).await?;

        self.tracker.clear_if_complete()?;
        Ok(Some(outcome))
    }

    async fn drive(&self, symbols: &[String]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();

        for symbol in symbols {
            if self.tracker.succeeded_today(symbol) {
                info!(symbol = %symbol, "Already crawled today, skipping");
                outcome.skipped += 1;
                continue;
            }

            self.tracker.mark(symbol, CrawlState::InProgress, None)?;

            match self.acquirer.get(symbol, DataKind::Daily).await {
                Ok(series) => {
                    self.tracker.mark(symbol, CrawlState::Success, None)?;
                    outcome.success += 1;
                    info!(symbol = %symbol, rows = series.len(), "Crawled daily series");
                }
                Err(e) => {
                    self.tracker
                        .mark(symbol, CrawlState::Failed, Some(e.to_string()))?;
                    outcome.failed += 1;
                    error!(symbol = %symbol, error = %e, "Failed to crawl symbol");
                }
            }

            // Batch-level vendor rate limit
            sleep(self.config.fetch_delay).await;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Instrument;
    use crate::error::{Error, Result};
    use crate::models::CrawlState;
    use crate::providers::{ProviderChain, ProviderClient, RawTable};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use std::time::Duration;
    use tempfile::TempDir;

    struct GoodProvider;
    struct BadProvider;

    fn recent_rows() -> Vec<Vec<String>> {
        let today = beijing_today();
        (0..40)
            .rev()
            .map(|i| {
                let date: NaiveDate = today - ChronoDuration::days(i);
                vec![
                    date.format("%Y-%m-%d").to_string(),
                    "1.0".to_string(),
                    "1.1".to_string(),
                    "0.9".to_string(),
                    "1.0".to_string(),
                    "1000".to_string(),
                ]
            })
            .collect()
    }

    #[async_trait]
    impl ProviderClient for GoodProvider {
        fn name(&self) -> &'static str {
            "good"
        }
        async fn fetch(
            &self,
            _symbol: &str,
            _kind: DataKind,
            _since: Option<NaiveDate>,
        ) -> Result<RawTable> {
            let columns = ["date", "open", "high", "low", "close", "volume"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            Ok(RawTable::new(columns, recent_rows()))
        }
    }

    #[async_trait]
    impl ProviderClient for BadProvider {
        fn name(&self) -> &'static str {
            "bad"
        }
        async fn fetch(
            &self,
            _symbol: &str,
            _kind: DataKind,
            _since: Option<NaiveDate>,
        ) -> Result<RawTable> {
            Err(Error::VendorUnavailable("connection refused".to_string()))
        }
    }

    fn config(dir: &TempDir, codes: &[&str]) -> AppConfig {
        AppConfig {
            data_dir: dir.path().to_path_buf(),
            fetch_delay: Duration::from_millis(0),
            universe: codes.iter().map(|c| Instrument::new(c, c)).collect(),
            ..AppConfig::default()
        }
    }

    fn crawler(config: &AppConfig, provider: Box<dyn ProviderClient>) -> Crawler {
        let chain = ProviderChain::with_providers(vec![provider]);
        Crawler::with_acquirer(config, Acquirer::with_chain(config, chain))
    }

    #[tokio::test]
    async fn test_batch_success_clears_status_file() {
        if !is_trading_day(beijing_today()) {
            return;
        }
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &["510050", "510300"]);
        let crawler = crawler(&config, Box::new(GoodProvider));

        let outcome = crawler.run_daily().await.unwrap().unwrap();
        assert_eq!(outcome.success, 2);
        assert_eq!(outcome.failed, 0);
        // Every symbol succeeded, so the status file is gone
        assert!(!crawler.tracker().exists());
    }

    #[tokio::test]
    async fn test_failed_batch_is_resumable() {
        if !is_trading_day(beijing_today()) {
            return;
        }
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &["510050"]);

        // First run fails and leaves a retriable record behind
        let failing = crawler(&config, Box::new(BadProvider));
        let outcome = failing.run_daily().await.unwrap().unwrap();
        assert_eq!(outcome.failed, 1);
        assert!(failing.tracker().exists());
        assert_eq!(failing.tracker().pending_or_failed(), vec!["510050"]);

        // Resume with a healthy vendor re-drives only the failed symbol
        let healthy = crawler(&config, Box::new(GoodProvider));
        let outcome = healthy.resume().await.unwrap().unwrap();
        assert_eq!(outcome.success, 1);
        assert!(!healthy.tracker().exists());
    }

    #[tokio::test]
    async fn test_same_day_success_not_refetched() {
        if !is_trading_day(beijing_today()) {
            return;
        }
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &["510050"]);
        let crawler = crawler(&config, Box::new(GoodProvider));

        crawler.tracker().mark("510050", CrawlState::Success, None).unwrap();
        let outcome = crawler.run_daily().await.unwrap().unwrap();
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.success, 0);
    }
}
