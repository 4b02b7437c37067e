use crate::config::AppConfig;
use crate::models::{Bucket, Pool, PoolEntry, ScoreRecord};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Risk-bucketed pool selection
///
/// Ranks scored symbols, splits them by the risk threshold into
/// stable-eligible and aggressive-eligible sets, and takes the top K of
/// each. A short bucket is filled from the configured fallback list so
/// neither bucket is ever empty.
pub struct PoolSelector {
    pool_size: usize,
    risk_threshold: f64,
}

impl PoolSelector {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            pool_size: config.pool_size,
            risk_threshold: config.risk_threshold,
        }
    }

    /// Assemble a pool snapshot.
    ///
    /// `stable_fallback` / `aggressive_fallback` are the configured
    /// backstop symbols, scored through the same engine as everything
    /// else. `names` maps symbols to display names.
    pub fn select(
        &self,
        scored: &[ScoreRecord],
        stable_fallback: &[ScoreRecord],
        aggressive_fallback: &[ScoreRecord],
        names: &HashMap<String, String>,
        generated_at: DateTime<Utc>,
    ) -> Pool {
        let mut stable_eligible: Vec<&ScoreRecord> = scored
            .iter()
            .filter(|r| r.risk >= self.risk_threshold)
            .collect();
        let mut aggressive_eligible: Vec<&ScoreRecord> = scored
            .iter()
            .filter(|r| r.risk < self.risk_threshold)
            .collect();

        // Top K by total; stable ties prefer risk control, aggressive
        // ties prefer return potential
        stable_eligible.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then(b.risk.total_cmp(&a.risk))
        });
        aggressive_eligible.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then(b.returns.total_cmp(&a.returns))
        });

        let mut taken: HashSet<String> = HashSet::new();
        let stable = self.fill_bucket(
            Bucket::Stable,
            &stable_eligible,
            stable_fallback,
            names,
            &mut taken,
        );
        let aggressive = self.fill_bucket(
            Bucket::Aggressive,
            &aggressive_eligible,
            aggressive_fallback,
            names,
            &mut taken,
        );

        let mut entries = stable;
        entries.extend(aggressive);
        Pool::new(generated_at, entries)
    }

    fn fill_bucket(
        &self,
        bucket: Bucket,
        eligible: &[&ScoreRecord],
        fallback: &[ScoreRecord],
        names: &HashMap<String, String>,
        taken: &mut HashSet<String>,
    ) -> Vec<PoolEntry> {
        let mut entries: Vec<PoolEntry> = Vec::with_capacity(self.pool_size);

        for record in eligible {
            if entries.len() == self.pool_size {
                break;
            }
            if taken.insert(record.symbol.clone()) {
                entries.push(self.entry(bucket, record, names));
            }
        }

        if entries.len() < self.pool_size {
            warn!(
                bucket = %bucket,
                eligible = entries.len(),
                needed = self.pool_size,
                "Bucket short of candidates, filling from fallback list"
            );
            for record in fallback {
                if entries.len() == self.pool_size {
                    break;
                }
                if taken.insert(record.symbol.clone()) {
                    entries.push(self.entry(bucket, record, names));
                }
            }
        }

        if entries.len() < self.pool_size {
            warn!(bucket = %bucket, got = entries.len(), "Bucket still short after fallback");
        }

        entries
    }

    fn entry(
        &self,
        bucket: Bucket,
        record: &ScoreRecord,
        names: &HashMap<String, String>,
    ) -> PoolEntry {
        PoolEntry {
            symbol: record.symbol.clone(),
            name: names
                .get(&record.symbol)
                .cloned()
                .unwrap_or_else(|| record.symbol.clone()),
            bucket,
            score: record.clone(),
        }
    }
}
