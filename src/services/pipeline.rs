use crate::config::{AppConfig, Instrument};
use crate::error::{Error, Result};
use crate::models::{AuxSignals, CrawlState, DataKind, Pool, ScoreRecord, Series};
use crate::providers::{HttpFetcher, SinaClient};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{info, warn};

use super::acquirer::Acquirer;
use super::pool_selector::PoolSelector;
use super::scoring::ScoringEngine;
use super::status_tracker::StatusTracker;
use super::valuation;

/// End-to-end pool generation
///
/// Acquires every universe symbol, derives auxiliary signals, scores,
/// selects the bucketed pool, persists a dated snapshot and renders the
/// summary text handed to the (out-of-scope) messaging layer.
pub struct Pipeline {
    config: AppConfig,
    acquirer: Acquirer,
    engine: ScoringEngine,
    selector: PoolSelector,
    tracker: StatusTracker,
    sina: Option<SinaClient>,
}

impl Pipeline {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.request_timeout, config.max_retries)?);
        Ok(Self::with_parts(
            config,
            Acquirer::new(config)?,
            Some(SinaClient::new(fetcher)),
        ))
    }

    /// Build with explicit parts (tests, custom vendor wiring). Passing
    /// no Sina client disables constituent lookups; the affected
    /// sub-scores degrade to their neutral default.
    pub fn with_parts(config: &AppConfig, acquirer: Acquirer, sina: Option<SinaClient>) -> Self {
        Self {
            config: config.clone(),
            acquirer,
            engine: ScoringEngine::new(),
            selector: PoolSelector::new(config),
            tracker: StatusTracker::new(config),
            sina,
        }
    }

    /// Run the whole pipeline and return the new pool plus a
    /// human-readable summary.
    pub async fn generate_pool(&self) -> Result<(Pool, String)> {
        let mut scored: HashMap<String, ScoreRecord> = HashMap::new();

        for instrument in &self.config.universe {
            match self.score_symbol(&instrument.code).await {
                Ok(record) => {
                    scored.insert(instrument.code.clone(), record);
                }
                Err(e) => {
                    // Excluded from this cycle; retryable on the next run
                    warn!(symbol = %instrument.code, error = %e, "Symbol excluded from scoring cycle");
                    self.tracker
                        .mark(&instrument.code, CrawlState::Failed, Some(e.to_string()))?;
                }
            }
            sleep(self.config.fetch_delay).await;
        }

        if scored.is_empty() {
            return Err(Error::Unavailable(
                "no universe symbol could be scored".to_string(),
            ));
        }

        let stable_fallback = self
            .score_list(&self.config.stable_fallback, &mut scored)
            .await;
        let aggressive_fallback = self
            .score_list(&self.config.aggressive_fallback, &mut scored)
            .await;

        let universe_scores: Vec<ScoreRecord> = self
            .config
            .universe
            .iter()
            .filter_map(|i| scored.get(&i.code).cloned())
            .collect();

        let pool = self.selector.select(
            &universe_scores,
            &stable_fallback,
            &aggressive_fallback,
            &self.display_names(),
            chrono::Utc::now(),
        );

        self.save_snapshot(&pool)?;
        let summary = render_summary(&pool);

        info!(
            entries = pool.entries.len(),
            stable = pool.stable().count(),
            aggressive = pool.aggressive().count(),
            "Generated pool snapshot"
        );
        Ok((pool, summary))
    }

    /// Acquire and score a single symbol
    pub async fn score_symbol(&self, symbol: &str) -> Result<ScoreRecord> {
        let series = self.acquirer.get(symbol, DataKind::Daily).await?;
        let aux = self.aux_signals(symbol, &series).await;
        Ok(self.engine.score(symbol, &series, &aux))
    }

    /// Auxiliary signals for the premium and sentiment sub-scores.
    ///
    /// Best-effort: constituents come from the Sina listing when
    /// available, constituent prices only from the local cache (no
    /// recursive vendor fetches). Anything missing degrades to the
    /// neutral default downstream.
    async fn aux_signals(&self, symbol: &str, series: &Series) -> AuxSignals {
        let Some(sina) = &self.sina else {
            return AuxSignals::default();
        };

        let holdings = match sina.fetch_holdings(symbol).await {
            Ok(holdings) if !holdings.is_empty() => holdings,
            Ok(_) => return AuxSignals::default(),
            Err(e) => {
                warn!(symbol, error = %e, "Constituent lookup failed, using neutral signals");
                return AuxSignals::default();
            }
        };

        let profile = valuation::holdings_profile(&holdings);

        let mut prices: HashMap<String, f64> = HashMap::new();
        for holding in &holdings {
            if let Some(series) = self.acquirer.cache().load(
                &holding.code,
                DataKind::Daily,
                self.config.cache_max_age_days,
            ) {
                if let Some(last) = series.last() {
                    prices.insert(holding.code.clone(), last.close);
                }
            }
        }

        let premium = series.last().and_then(|last| {
            valuation::estimate_nav(&holdings, &prices)
                .map(|nav| valuation::premium_rate(last.close, nav))
        });

        AuxSignals {
            asset_scale: None,
            premium_rate_pct: premium,
            holdings: Some(profile),
        }
    }

    /// Score the given fallback instruments, reusing records already
    /// computed this cycle. Failures are skipped: the fallback list is a
    /// backstop, not a guarantee.
    async fn score_list(
        &self,
        instruments: &[Instrument],
        scored: &mut HashMap<String, ScoreRecord>,
    ) -> Vec<ScoreRecord> {
        let mut records = Vec::with_capacity(instruments.len());

        for instrument in instruments {
            if let Some(record) = scored.get(&instrument.code) {
                records.push(record.clone());
                continue;
            }
            match self.score_symbol(&instrument.code).await {
                Ok(record) => {
                    scored.insert(instrument.code.clone(), record.clone());
                    records.push(record);
                }
                Err(e) => {
                    warn!(symbol = %instrument.code, error = %e, "Fallback symbol could not be scored");
                }
            }
            sleep(self.config.fetch_delay).await;
        }

        records
    }

    fn display_names(&self) -> HashMap<String, String> {
        self.config
            .universe
            .iter()
            .chain(&self.config.stable_fallback)
            .chain(&self.config.aggressive_fallback)
            .map(|i| (i.code.clone(), i.name.clone()))
            .collect()
    }

    /// Persist the dated snapshot, never mutating a prior one
    fn save_snapshot(&self, pool: &Pool) -> Result<()> {
        let dir = self.config.pool_dir();
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(pool.snapshot_filename());
        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, serde_json::to_string_pretty(pool)?)?;
        std::fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            Error::Io(format!("Failed to write pool snapshot: {}", e))
        })?;

        info!(path = %path.display(), "Saved pool snapshot");
        Ok(())
    }
}

/// Human-readable pool summary for the messaging layer
fn render_summary(pool: &Pool) -> String {
    let mut out = format!(
        "ETF pool {}\n",
        pool.generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    out.push_str("\nStable bucket:\n");
    for (i, entry) in pool.stable().enumerate() {
        out.push_str(&format!(
            "  {}. {} {} - total {:.1} (risk {:.1}, return {:.1})\n",
            i + 1,
            entry.symbol,
            entry.name,
            entry.score.total,
            entry.score.risk,
            entry.score.returns,
        ));
    }

    out.push_str("\nAggressive bucket:\n");
    for (i, entry) in pool.aggressive().enumerate() {
        out.push_str(&format!(
            "  {}. {} {} - total {:.1} (risk {:.1}, return {:.1})\n",
            i + 1,
            entry.symbol,
            entry.name,
            entry.score.total,
            entry.score.risk,
            entry.score.returns,
        ));
    }

    out
}
