//! Scoring and selection constants
//!
//! Defines the fixed weights and window sizes used by the scoring engine
//! and the pool selector.
//!
//! ## Weighting
//!
//! The total score is a weighted sum of five sub-scores, each on a 0-100
//! scale:
//!
//! | Factor    | Weight | Driven by                              |
//! |-----------|--------|----------------------------------------|
//! | liquidity | 0.20   | 30-day average volume, asset scale     |
//! | risk      | 0.25   | annualized volatility, max drawdown    |
//! | return    | 0.25   | 1y / 3y return, Sharpe ratio           |
//! | premium   | 0.15   | price deviation from estimated NAV     |
//! | sentiment | 0.15   | top-5 holdings weight, group diversity |

/// Weight of the liquidity sub-score in the total
pub const WEIGHT_LIQUIDITY: f64 = 0.20;

/// Weight of the risk-control sub-score in the total
pub const WEIGHT_RISK: f64 = 0.25;

/// Weight of the return sub-score in the total
pub const WEIGHT_RETURN: f64 = 0.25;

/// Weight of the premium sub-score in the total
pub const WEIGHT_PREMIUM: f64 = 0.15;

/// Weight of the sentiment sub-score in the total
pub const WEIGHT_SENTIMENT: f64 = 0.15;

/// Neutral sub-score used when the required input is missing.
/// Keeps ranking stable when a single vendor misses a field.
pub const NEUTRAL_SCORE: f64 = 60.0;

/// Trading sessions per year
pub const SESSIONS_PER_YEAR: usize = 252;

/// Trading sessions in three years
pub const SESSIONS_THREE_YEARS: usize = 756;

/// Minimum daily returns required to compute volatility/drawdown
pub const MIN_RETURNS_FOR_RISK: usize = 30;

/// Trailing window for max drawdown (sessions)
pub const DRAWDOWN_WINDOW: usize = 252;

/// Rolling window for average volume (sessions)
pub const VOLUME_WINDOW: usize = 30;

/// Volume cap for the liquidity score: 30-day average volume at or above
/// this value scores 100
pub const VOLUME_CAP: f64 = 1_000_000_000.0;

/// Asset scale cap (billions) for the liquidity score
pub const SCALE_CAP: f64 = 10.0;

/// Placeholder asset scale (billions) used when fund size is unknown
pub const DEFAULT_ASSET_SCALE: f64 = 5.0;

/// Management-fee haircut applied to the estimated NAV
pub const NAV_FEE_HAIRCUT: f64 = 0.995;

/// Number of entries per pool bucket
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Risk sub-score at or above which a symbol is stable-eligible
pub const DEFAULT_RISK_THRESHOLD: f64 = 75.0;

/// Broad-market symbols used to fill a short stable bucket
pub const STABLE_FALLBACK: &[(&str, &str)] = &[
    ("510050", "SSE 50 ETF"),
    ("510300", "CSI 300 ETF"),
    ("510500", "CSI 500 ETF"),
    ("159919", "CSI 300 ETF SZ"),
    ("515790", "Photovoltaic ETF"),
];

/// Sector symbols used to fill a short aggressive bucket
pub const AGGRESSIVE_FALLBACK: &[(&str, &str)] = &[
    ("512480", "Semiconductor ETF"),
    ("512660", "Defense ETF"),
    ("512880", "Securities ETF"),
    ("512980", "Telecom ETF"),
    ("159995", "Chip ETF"),
];

/// Default tracked universe when no universe file is configured
pub const DEFAULT_UNIVERSE: &[(&str, &str)] = &[
    ("510050", "SSE 50 ETF"),
    ("510300", "CSI 300 ETF"),
    ("510500", "CSI 500 ETF"),
    ("159915", "ChiNext ETF"),
    ("512888", "Consumer ETF"),
    ("512480", "Semiconductor ETF"),
    ("512660", "Defense ETF"),
    ("512980", "Telecom ETF"),
    ("159825", "New Energy ETF"),
    ("159995", "Chip ETF"),
];
