use serde::{Deserialize, Serialize};

/// Five-factor quality score for one symbol
///
/// Every sub-score and the total lie in [0, 100]. Recomputed fresh on each
/// scoring pass; only pool snapshots persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub symbol: String,

    /// Trading activity: 30-day average volume and asset scale
    pub liquidity: f64,

    /// Risk control: annualized volatility and max drawdown (higher = safer)
    pub risk: f64,

    /// Historical performance: 1y/3y return and Sharpe ratio
    #[serde(rename = "return")]
    pub returns: f64,

    /// Price deviation from estimated NAV (closer to fair = higher)
    pub premium: f64,

    /// Holdings concentration and group diversity
    pub sentiment: f64,

    /// Weighted total
    pub total: f64,
}

/// Auxiliary per-symbol signals that feed the premium and sentiment
/// sub-scores. Every field is optional; missing inputs degrade to the
/// neutral default instead of failing the computation.
#[derive(Debug, Clone, Default)]
pub struct AuxSignals {
    /// Fund size in billions
    pub asset_scale: Option<f64>,

    /// (market price - estimated NAV) / estimated NAV * 100
    pub premium_rate_pct: Option<f64>,

    /// Constituent-derived concentration profile
    pub holdings: Option<HoldingsProfile>,
}

/// Concentration summary of a fund's constituents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldingsProfile {
    /// Combined weight of the five largest constituents (0..1)
    pub top5_weight: f64,

    /// Distinct group count (proxy: one group per five constituents)
    pub group_count: usize,
}
