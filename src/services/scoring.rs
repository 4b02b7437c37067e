//! Five-factor quality scoring
//!
//! Pure functions over a bar series plus auxiliary signals. Each
//! sub-score is clamped to [0, 100]; a sub-score whose required input is
//! missing returns the neutral default instead of failing, so a single
//! vendor gap cannot destabilize the ranking.

use crate::constants::{
    DEFAULT_ASSET_SCALE, DRAWDOWN_WINDOW, MIN_RETURNS_FOR_RISK, NEUTRAL_SCORE, SCALE_CAP,
    SESSIONS_PER_YEAR, SESSIONS_THREE_YEARS, VOLUME_CAP, VOLUME_WINDOW, WEIGHT_LIQUIDITY,
    WEIGHT_PREMIUM, WEIGHT_RETURN, WEIGHT_RISK, WEIGHT_SENTIMENT,
};
use crate::models::{AuxSignals, Bar, ScoreRecord};

/// Deterministic scoring engine
///
/// Stateless; the struct exists so callers hold one configured instance
/// alongside the acquirer and selector.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score one symbol from its daily series and auxiliary signals
    pub fn score(&self, symbol: &str, series: &[Bar], aux: &AuxSignals) -> ScoreRecord {
        let liquidity = liquidity_score(series, aux);
        let risk = risk_score(series);
        let returns = return_score(series);
        let premium = premium_score(aux);
        let sentiment = sentiment_score(aux);

        let total = liquidity * WEIGHT_LIQUIDITY
            + risk * WEIGHT_RISK
            + returns * WEIGHT_RETURN
            + premium * WEIGHT_PREMIUM
            + sentiment * WEIGHT_SENTIMENT;

        ScoreRecord {
            symbol: symbol.to_string(),
            liquidity: round1(liquidity),
            risk: round1(risk),
            returns: round1(returns),
            premium: round1(premium),
            sentiment: round1(sentiment),
            total: round1(total),
        }
    }
}

/// Liquidity: 30-day average volume against the volume cap, asset scale
/// against the scale cap (0.6 / 0.4)
fn liquidity_score(series: &[Bar], aux: &AuxSignals) -> f64 {
    if series.is_empty() {
        return NEUTRAL_SCORE;
    }

    let window = series.len().min(VOLUME_WINDOW);
    let avg_volume: f64 =
        series[series.len() - window..].iter().map(|b| b.volume).sum::<f64>() / window as f64;

    let scale = aux.asset_scale.unwrap_or(DEFAULT_ASSET_SCALE);

    let volume_score = clamp(avg_volume / VOLUME_CAP * 100.0);
    let scale_score = clamp(scale / SCALE_CAP * 100.0);

    volume_score * 0.6 + scale_score * 0.4
}

/// Risk control: annualized volatility and trailing max drawdown
/// (0.6 / 0.4, both inverted so lower risk scores higher)
fn risk_score(series: &[Bar]) -> f64 {
    let returns = daily_returns(series);
    if returns.len() < MIN_RETURNS_FOR_RISK {
        return NEUTRAL_SCORE;
    }

    let annual_volatility = stdev(&returns) * (SESSIONS_PER_YEAR as f64).sqrt() * 100.0;
    let mdd = max_drawdown(series);

    let volatility_score = clamp(100.0 - annual_volatility * 2.0);
    let drawdown_score = clamp(100.0 - mdd * 2.0);

    volatility_score * 0.6 + drawdown_score * 0.4
}

/// Return: 1-year and 3-year performance plus Sharpe ratio
/// (0.3 / 0.4 / 0.3); inputs default to zero on short history
fn return_score(series: &[Bar]) -> f64 {
    let closes: Vec<f64> = series.iter().map(|b| b.close).collect();

    let one_year = trailing_return(&closes, SESSIONS_PER_YEAR);
    let three_year = if closes.len() >= SESSIONS_THREE_YEARS {
        trailing_return(&closes, SESSIONS_THREE_YEARS)
    } else {
        one_year * 3.0
    };

    let returns = daily_returns(series);
    let sd = stdev(&returns);
    let sharpe = if returns.is_empty() || sd == 0.0 {
        0.0
    } else {
        mean(&returns) / sd * (SESSIONS_PER_YEAR as f64).sqrt()
    };

    let one_year_score = clamp(one_year * 2.0);
    let three_year_score = clamp(three_year);
    let sharpe_score = clamp(sharpe * 10.0);

    one_year_score * 0.3 + three_year_score * 0.4 + sharpe_score * 0.3
}

/// Premium: distance of market price from estimated NAV, with small
/// bonuses for a modest premium or discount
fn premium_score(aux: &AuxSignals) -> f64 {
    let Some(premium_rate) = aux.premium_rate_pct else {
        return NEUTRAL_SCORE;
    };

    let mut score = clamp(100.0 - premium_rate.abs() * 5.0);

    // A modest premium is healthy; a slight discount is acceptable
    if (0.5..=1.5).contains(&premium_rate) {
        score = (score + 10.0).min(100.0);
    }
    if (-1.0..0.0).contains(&premium_rate) {
        score = (score + 5.0).min(100.0);
    }

    score
}

/// Sentiment: top-5 holdings concentration and group diversity
/// (0.6 / 0.4)
fn sentiment_score(aux: &AuxSignals) -> f64 {
    let Some(profile) = aux.holdings else {
        return NEUTRAL_SCORE;
    };

    let leader_score = clamp(profile.top5_weight * 150.0);
    let diversity_score = clamp(profile.group_count.min(10) as f64 * 10.0);

    leader_score * 0.6 + diversity_score * 0.4
}

/// Percentage return over the trailing `sessions` rows, zero when the
/// history is shorter
fn trailing_return(closes: &[f64], sessions: usize) -> f64 {
    if closes.len() < sessions {
        return 0.0;
    }
    let start = closes[closes.len() - sessions];
    let end = closes[closes.len() - 1];
    if start <= 0.0 {
        return 0.0;
    }
    (end / start - 1.0) * 100.0
}

/// Max drawdown (percent) over the trailing window: worst drop of close
/// below its running maximum
fn max_drawdown(series: &[Bar]) -> f64 {
    let start = series.len().saturating_sub(DRAWDOWN_WINDOW);
    let window = &series[start..];

    let mut rolling_max = f64::MIN;
    let mut worst = 0.0f64;
    for bar in window {
        rolling_max = rolling_max.max(bar.close);
        if rolling_max > 0.0 {
            worst = worst.max(1.0 - bar.close / rolling_max);
        }
    }
    worst * 100.0
}

fn daily_returns(series: &[Bar]) -> Vec<f64> {
    series
        .windows(2)
        .filter(|w| w[0].close > 0.0)
        .map(|w| w[1].close / w[0].close - 1.0)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation
fn stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn clamp(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HoldingsProfile;
    use chrono::{Duration, NaiveDate};

    fn series_with_closes(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                Bar::new(
                    start + Duration::days(i as i64),
                    *close,
                    close * 1.01,
                    close * 0.99,
                    *close,
                    1_000_000.0,
                )
            })
            .collect()
    }

    fn flat_series(len: usize) -> Vec<Bar> {
        series_with_closes(&vec![1.0; len])
    }

    #[test]
    fn test_scores_bounded_for_extreme_inputs() {
        let engine = ScoringEngine::new();

        // Wild series: huge volume, violent swings, extreme premium
        let closes: Vec<f64> = (0..300)
            .map(|i| if i % 2 == 0 { 100.0 } else { 1.0 })
            .collect();
        let mut series = series_with_closes(&closes);
        for bar in &mut series {
            bar.volume = 1e15;
        }
        let aux = AuxSignals {
            asset_scale: Some(1e9),
            premium_rate_pct: Some(-500.0),
            holdings: Some(HoldingsProfile {
                top5_weight: 50.0,
                group_count: 10_000,
            }),
        };

        let record = engine.score("X", &series, &aux);
        for value in [
            record.liquidity,
            record.risk,
            record.returns,
            record.premium,
            record.sentiment,
            record.total,
        ] {
            assert!((0.0..=100.0).contains(&value), "out of bounds: {}", value);
        }
    }

    #[test]
    fn test_short_history_never_errors() {
        // 100 sessions: under both the 252 and 756 thresholds
        let engine = ScoringEngine::new();
        let series = series_with_closes(&(0..100).map(|i| 1.0 + i as f64 * 0.001).collect::<Vec<_>>());
        let record = engine.score("510050", &series, &AuxSignals::default());
        assert!(record.total > 0.0);
        // One-year return input defaults to zero on short history
        assert!(record.returns <= 100.0);
    }

    #[test]
    fn test_three_year_falls_back_to_triple_one_year() {
        // 300 sessions: enough for the 1y return, short of 3y
        let mut closes = vec![1.0; 48];
        closes.extend((0..252).map(|i| 1.0 + 0.10 * (i as f64 + 1.0) / 252.0));
        let series = series_with_closes(&closes);

        let one_year = trailing_return(
            &series.iter().map(|b| b.close).collect::<Vec<_>>(),
            SESSIONS_PER_YEAR,
        );
        assert!(one_year > 0.0);

        // Under 756 sessions the 3y input is 3x the 1y input, so the
        // score reflects min(100, 3 * one_year) in the 0.4 slot
        let record = ScoringEngine::new().score("X", &series, &AuxSignals::default());
        let expected_three_year_score = clamp(one_year * 3.0);
        let expected = clamp(one_year * 2.0) * 0.3 + expected_three_year_score * 0.4;
        // Sharpe contributes the remaining 0.3 slot; subtract it out
        assert!(record.returns >= round1(expected) - 0.1);
    }

    #[test]
    fn test_risk_neutral_on_short_history() {
        let series = flat_series(10);
        assert_eq!(risk_score(&series), NEUTRAL_SCORE);
    }

    #[test]
    fn test_risk_flat_series_scores_high() {
        // No volatility, no drawdown
        let series = flat_series(260);
        let score = risk_score(&series);
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_drawdown() {
        // Peak 2.0, trough 1.0 -> 50% drawdown
        let series = series_with_closes(&[1.0, 2.0, 1.5, 1.0, 1.2]);
        assert!((max_drawdown(&series) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_premium_score_bonuses() {
        let aux = |p: f64| AuxSignals {
            premium_rate_pct: Some(p),
            ..AuxSignals::default()
        };

        // Fair pricing, no bonus band
        assert_eq!(premium_score(&aux(0.0)), 100.0);
        // Modest premium: 100 - 5 + 10, capped at 100
        assert_eq!(premium_score(&aux(1.0)), 100.0);
        // Slight discount: 100 - 2.5 + 5, capped
        assert_eq!(premium_score(&aux(-0.5)), 100.0);
        // Heavy premium: 100 - 50, outside both bonus bands
        assert_eq!(premium_score(&aux(10.0)), 50.0);
        // Missing premium data degrades to neutral
        assert_eq!(premium_score(&AuxSignals::default()), NEUTRAL_SCORE);
    }

    #[test]
    fn test_sentiment_score() {
        let aux = AuxSignals {
            holdings: Some(HoldingsProfile {
                top5_weight: 0.5,
                group_count: 8,
            }),
            ..AuxSignals::default()
        };
        // leader 75, diversity 80
        assert!((sentiment_score(&aux) - (75.0 * 0.6 + 80.0 * 0.4)).abs() < 1e-9);
        assert_eq!(sentiment_score(&AuxSignals::default()), NEUTRAL_SCORE);
    }

    #[test]
    fn test_total_is_weighted_sum() {
        let engine = ScoringEngine::new();
        let series = flat_series(260);
        let record = engine.score("X", &series, &AuxSignals::default());

        let expected = record.liquidity * WEIGHT_LIQUIDITY
            + record.risk * WEIGHT_RISK
            + record.returns * WEIGHT_RETURN
            + record.premium * WEIGHT_PREMIUM
            + record.sentiment * WEIGHT_SENTIMENT;
        assert!((record.total - expected).abs() <= 0.3);
    }

    #[test]
    fn test_stdev_sample() {
        let values = [1.0, 2.0, 3.0, 4.0];
        // Sample variance of 1..4 is 5/3
        assert!((stdev(&values) - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(stdev(&[1.0]), 0.0);
    }
}
