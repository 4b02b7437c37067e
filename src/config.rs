use crate::constants::{
    AGGRESSIVE_FALLBACK, DEFAULT_POOL_SIZE, DEFAULT_RISK_THRESHOLD, DEFAULT_UNIVERSE,
    STABLE_FALLBACK,
};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// A tracked instrument (code + display name)
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub code: String,
    pub name: String,
}

impl Instrument {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

/// Explicit application configuration.
///
/// Built once in `main` (or a test) and passed by reference into the
/// acquirer, scoring engine and pool selector. There is no process-wide
/// mutable configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root data directory (cache, status file, pool snapshots)
    pub data_dir: PathBuf,

    /// Age window applied when loading cached series (days)
    pub cache_max_age_days: i64,

    /// Cached data newer than this many days skips the network entirely
    pub freshness_days: i64,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// Attempts per provider before the chain advances
    pub max_retries: u32,

    /// Delay between consecutive symbol acquisitions in a batch
    pub fetch_delay: Duration,

    /// Total time budget for one symbol across the whole provider chain
    pub symbol_deadline: Duration,

    /// Entries per pool bucket
    pub pool_size: usize,

    /// Risk sub-score at or above which a symbol is stable-eligible
    pub risk_threshold: f64,

    /// Symbols scored for the pool
    pub universe: Vec<Instrument>,

    /// Broad-market symbols filling a short stable bucket
    pub stable_fallback: Vec<Instrument>,

    /// Sector symbols filling a short aggressive bucket
    pub aggressive_fallback: Vec<Instrument>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_max_age_days: 365,
            freshness_days: 1,
            request_timeout: Duration::from_secs(15),
            max_retries: 3,
            fetch_delay: Duration::from_secs(1),
            symbol_deadline: Duration::from_secs(60),
            pool_size: DEFAULT_POOL_SIZE,
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            universe: instruments(DEFAULT_UNIVERSE),
            stable_fallback: instruments(STABLE_FALLBACK),
            aggressive_fallback: instruments(AGGRESSIVE_FALLBACK),
        }
    }
}

impl AppConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// Recognized variables: `ETF_DATA_DIR`, `ETF_CACHE_MAX_AGE_DAYS`,
    /// `ETF_POOL_SIZE`, `ETF_RISK_THRESHOLD`, `ETF_FETCH_DELAY_MS`,
    /// `ETF_UNIVERSE_FILE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("ETF_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(days) = parse_env::<i64>("ETF_CACHE_MAX_AGE_DAYS") {
            config.cache_max_age_days = days;
        }
        if let Some(size) = parse_env::<usize>("ETF_POOL_SIZE") {
            config.pool_size = size;
        }
        if let Some(threshold) = parse_env::<f64>("ETF_RISK_THRESHOLD") {
            config.risk_threshold = threshold;
        }
        if let Some(ms) = parse_env::<u64>("ETF_FETCH_DELAY_MS") {
            config.fetch_delay = Duration::from_millis(ms);
        }

        if let Ok(path) = std::env::var("ETF_UNIVERSE_FILE") {
            match load_universe(Path::new(&path)) {
                Ok(universe) if !universe.is_empty() => config.universe = universe,
                Ok(_) => warn!(path = %path, "Universe file is empty, keeping default universe"),
                Err(e) => warn!(path = %path, error = %e, "Failed to load universe file"),
            }
        }

        config
    }

    /// Directory holding per-symbol cache files
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("etf_data")
    }

    /// Directory holding dated pool snapshots
    pub fn pool_dir(&self) -> PathBuf {
        self.data_dir.join("stock_pool")
    }

    /// Path of the crawl status file
    pub fn status_file(&self) -> PathBuf {
        self.data_dir.join("crawl_status.json")
    }

    /// Create the data directories if they do not exist
    pub fn init_directories(&self) -> Result<()> {
        for dir in [self.cache_dir(), self.pool_dir()] {
            std::fs::create_dir_all(&dir)
                .map_err(|e| Error::Config(format!("Failed to create {}: {}", dir.display(), e)))?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}

fn instruments(pairs: &[(&str, &str)]) -> Vec<Instrument> {
    pairs
        .iter()
        .map(|(code, name)| Instrument::new(code, name))
        .collect()
}

/// Load a universe CSV (`code,name` per line, optional header)
fn load_universe(path: &Path) -> Result<Vec<Instrument>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut universe = Vec::new();
    for record in reader.records() {
        let record = record?;
        let code = record.get(0).unwrap_or("").trim();
        if code.is_empty() || code.eq_ignore_ascii_case("code") {
            continue;
        }
        let name = record.get(1).unwrap_or(code).trim();
        universe.push(Instrument::new(code, name));
    }
    Ok(universe)
}
