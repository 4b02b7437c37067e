use crate::models::ScoreRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk-based pool bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// High risk sub-score: favors drawdown control
    Stable,
    /// Lower risk sub-score: favors return potential
    Aggressive,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Stable => f.write_str("stable"),
            Bucket::Aggressive => f.write_str("aggressive"),
        }
    }
}

/// One selected instrument with its component scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    pub symbol: String,
    pub name: String,
    pub bucket: Bucket,
    pub score: ScoreRecord,
}

/// Ranked, bucketed selection of instruments
///
/// Immutable once generated; each scheduled update produces a new dated
/// snapshot instead of patching a prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<PoolEntry>,
}

impl Pool {
    pub fn new(generated_at: DateTime<Utc>, entries: Vec<PoolEntry>) -> Self {
        Self {
            generated_at,
            entries,
        }
    }

    pub fn stable(&self) -> impl Iterator<Item = &PoolEntry> {
        self.entries.iter().filter(|e| e.bucket == Bucket::Stable)
    }

    pub fn aggressive(&self) -> impl Iterator<Item = &PoolEntry> {
        self.entries.iter().filter(|e| e.bucket == Bucket::Aggressive)
    }

    /// Snapshot file name for the generation day, e.g. `stock_pool_20250815.json`
    pub fn snapshot_filename(&self) -> String {
        format!("stock_pool_{}.json", self.generated_at.format("%Y%m%d"))
    }
}
