use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::{Bar, DataKind, Series};
use chrono::Duration;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::trading_calendar::beijing_today;

/// Per-(symbol, kind) on-disk time series
///
/// One CSV file per symbol and kind under the cache directory. The series
/// is created on the first successful fetch, mutated only by merge-append
/// and replaced via write-temp-then-rename so a reader never observes a
/// half-written file.
pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            cache_dir: config.cache_dir(),
        }
    }

    /// Cache file path for a (symbol, kind)
    pub fn path(&self, symbol: &str, kind: DataKind) -> PathBuf {
        self.cache_dir
            .join(format!("{}_{}.csv", symbol, kind.to_filename()))
    }

    /// Load the cached series, keeping only rows within the age window,
    /// oldest first. Missing or undeserializable files read as absent:
    /// a corrupt cache is rebuilt from providers rather than surfaced.
    pub fn load(&self, symbol: &str, kind: DataKind, max_age_days: i64) -> Option<Series> {
        let mut series = self.read_all(symbol, kind)?;

        let cutoff = beijing_today() - Duration::days(max_age_days);
        series.retain(|bar| bar.date >= cutoff);

        if series.is_empty() {
            None
        } else {
            Some(series)
        }
    }

    /// Merge new rows into the cached series and persist atomically.
    ///
    /// The existing file is read ignoring the age window, new rows are
    /// appended, duplicates are dropped keeping the newest occurrence per
    /// date, and the result is sorted ascending. Returns the merged
    /// series. A failed write leaves the prior file untouched.
    pub fn merge_and_save(&self, symbol: &str, kind: DataKind, new_rows: &[Bar]) -> Result<Series> {
        let mut combined = self.read_all(symbol, kind).unwrap_or_default();
        combined.extend_from_slice(new_rows);

        // Last occurrence per date wins (fresh rows override cached ones)
        let mut seen = HashSet::new();
        let mut merged: Series = Vec::with_capacity(combined.len());
        for bar in combined.into_iter().rev() {
            if seen.insert(bar.date) {
                merged.push(bar);
            }
        }
        merged.sort_by_key(|bar| bar.date);

        self.write_atomic(symbol, kind, &merged)?;
        info!(
            symbol,
            kind = %kind,
            rows = merged.len(),
            "Saved merged series to cache"
        );
        Ok(merged)
    }

    /// Read the whole cached series without an age window.
    ///
    /// Returns `None` for a missing file. A file that fails to
    /// deserialize (corrupt or unexpected columns) is also treated as
    /// absent so the next merge overwrites it with fresh rows.
    fn read_all(&self, symbol: &str, kind: DataKind) -> Option<Series> {
        let path = self.path(symbol, kind);
        if !path.exists() {
            return None;
        }

        let mut reader = match csv::Reader::from_path(&path) {
            Ok(reader) => reader,
            Err(e) => {
                warn!(symbol, kind = %kind, error = %e, "Cache unreadable, treating as absent");
                return None;
            }
        };

        let mut series = Series::new();
        for record in reader.deserialize::<Bar>() {
            match record {
                Ok(bar) => series.push(bar),
                Err(e) => {
                    warn!(symbol, kind = %kind, error = %e, "Cache corrupt, treating as absent");
                    return None;
                }
            }
        }

        debug!(symbol, kind = %kind, rows = series.len(), "Loaded cached series");
        Some(series)
    }

    fn write_atomic(&self, symbol: &str, kind: DataKind, series: &[Bar]) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir)?;

        let path = self.path(symbol, kind);
        let tmp_path = path.with_extension("csv.tmp");

        let result = (|| -> Result<()> {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            for bar in series {
                writer.serialize(bar)?;
            }
            writer.flush()?;
            Ok(())
        })();

        if let Err(e) = result {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }

        std::fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            Error::Io(format!("Failed to replace {}: {}", path.display(), e))
        })
    }
}
