use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::{CrawlRecord, CrawlState};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

use super::trading_calendar::{beijing_date, beijing_today};

/// Per-symbol crawl state persisted as a small JSON side file
///
/// The mapping lives for one batch run: it is deleted outright (not just
/// emptied) once every tracked symbol has succeeded, so the next run
/// starts clean. A resumed run re-drives only the pending/failed set.
pub struct StatusTracker {
    path: PathBuf,
}

impl StatusTracker {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            path: config.status_file(),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the current status map; a missing or corrupt file reads as
    /// empty.
    pub fn snapshot(&self) -> HashMap<String, CrawlRecord> {
        if !self.path.exists() {
            return HashMap::new();
        }

        match std::fs::read_to_string(&self.path) {
            Ok(body) => match serde_json::from_str(&body) {
                Ok(map) => map,
                Err(e) => {
                    warn!(error = %e, "Crawl status file corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) => {
                warn!(error = %e, "Crawl status file unreadable, starting empty");
                HashMap::new()
            }
        }
    }

    /// Record a state transition for one symbol
    pub fn mark(&self, symbol: &str, state: CrawlState, error: Option<String>) -> Result<()> {
        let mut status = self.snapshot();
        status.insert(symbol.to_string(), CrawlRecord::new(state, error));
        self.write_atomic(&status)
    }

    /// Symbols that a resumed batch must re-drive
    pub fn pending_or_failed(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .snapshot()
            .into_iter()
            .filter(|(_, record)| record.state.needs_retry())
            .map(|(symbol, _)| symbol)
            .collect();
        symbols.sort();
        symbols
    }

    /// Whether the symbol already succeeded on the current exchange-local
    /// calendar day (such symbols are never re-fetched within the day)
    pub fn succeeded_today(&self, symbol: &str) -> bool {
        self.snapshot()
            .get(symbol)
            .map(|record| {
                record.state == CrawlState::Success
                    && beijing_date(record.timestamp) == beijing_today()
            })
            .unwrap_or(false)
    }

    /// Delete the status file once every tracked symbol is `Success`.
    /// Returns whether the file was removed.
    pub fn clear_if_complete(&self) -> Result<bool> {
        let status = self.snapshot();
        if status.is_empty() || !status.values().all(|r| r.state == CrawlState::Success) {
            return Ok(false);
        }

        std::fs::remove_file(&self.path)
            .map_err(|e| Error::Io(format!("Failed to remove status file: {}", e)))?;
        info!("All symbols crawled, removed status file");
        Ok(true)
    }

    fn write_atomic(&self, status: &HashMap<String, CrawlRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(status)?;

        std::fs::write(&tmp_path, body)?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            Error::Io(format!("Failed to replace status file: {}", e))
        })
    }
}
