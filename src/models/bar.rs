use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day's OHLCV record for an instrument
///
/// Within a series, dates are unique and strictly increasing after merge.
/// Prices are positive; volume is non-negative (some vendors report
/// turnover instead of share count, so it is kept as a decimal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Calendar day of the record
    pub date: NaiveDate,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Trading volume
    pub volume: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Ordered sequence of bars for one (symbol, kind)
pub type Series = Vec<Bar>;
