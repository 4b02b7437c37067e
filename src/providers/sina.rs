use crate::error::{Error, Result};
use crate::models::DataKind;
use crate::providers::{exchange_prefix, pure_code, HttpFetcher, ProviderClient, RawTable};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const KLINE_URL: &str =
    "http://money.finance.sina.com.cn/quotes_service/api/json_v2.php/CN_MarketData.getKLineData";
const COMPONENT_URL: &str =
    "http://vip.stock.finance.sina.com.cn/quotes_service/api/json_v2.php/Market_Center.getHQNodeData";

/// Column order extracted from Sina kline objects
const FIELDS: &[&str] = &["day", "open", "high", "low", "close", "volume"];

/// One fund constituent with its portfolio weight (0..1)
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub code: String,
    pub weight: f64,
}

/// Sina finance kline endpoint (first fallback vendor)
///
/// Also exposes the constituent listing used to derive the sentiment and
/// premium auxiliary signals.
pub struct SinaClient {
    http: Arc<HttpFetcher>,
}

impl SinaClient {
    pub fn new(http: Arc<HttpFetcher>) -> Self {
        Self { http }
    }

    fn full_code(symbol: &str) -> String {
        let code = pure_code(symbol);
        format!("{}{}", exchange_prefix(code), code)
    }

    /// Fetch constituent market caps and convert them into weights.
    ///
    /// Best-effort: a fund without published constituents yields an empty
    /// list and the caller degrades to neutral sub-scores.
    pub async fn fetch_holdings(&self, symbol: &str) -> Result<Vec<Holding>> {
        let url = format!(
            "{}?page=1&num=80&sort=symbol&asc=1&node=etf_cf_{}",
            COMPONENT_URL,
            pure_code(symbol)
        );

        let payload = self.http.get_json("sina", &url).await?;
        let rows = payload.as_array().ok_or_else(|| {
            Error::SchemaMismatch(format!("sina: constituent payload is not a list for {}", symbol))
        })?;

        let mut caps: Vec<(String, f64)> = Vec::new();
        for row in rows {
            let code = row
                .get("symbol")
                .or_else(|| row.get("code"))
                .and_then(|v| v.as_str());
            let cap = row.get("mktcap").and_then(value_as_f64);

            if let (Some(code), Some(cap)) = (code, cap) {
                if cap > 0.0 {
                    caps.push((code.to_string(), cap));
                }
            }
        }

        let total: f64 = caps.iter().map(|(_, cap)| cap).sum();
        if total <= 0.0 {
            warn!(symbol, "Sina returned no usable constituents");
            return Ok(Vec::new());
        }

        Ok(caps
            .into_iter()
            .map(|(code, cap)| Holding {
                code,
                weight: cap / total,
            })
            .collect())
    }
}

#[async_trait]
impl ProviderClient for SinaClient {
    fn name(&self) -> &'static str {
        "sina"
    }

    async fn fetch(
        &self,
        symbol: &str,
        kind: DataKind,
        since: Option<NaiveDate>,
    ) -> Result<RawTable> {
        let datalen = match since {
            // Enough rows to cover the gap, small buffer for holidays
            Some(date) => {
                let days = (chrono::Utc::now().date_naive() - date).num_days().max(1);
                (days as usize + 10).min(1023)
            }
            None => kind.fetch_depth(),
        };

        let url = format!(
            "{}?symbol={}&scale=240&ma=no&datalen={}",
            KLINE_URL,
            Self::full_code(symbol),
            datalen
        );

        let payload = self.http.get_json(self.name(), &url).await?;
        let rows_json = payload.as_array().ok_or_else(|| {
            Error::SchemaMismatch(format!("{}: kline payload is not a list for {}", self.name(), symbol))
        })?;

        let columns: Vec<String> = FIELDS.iter().map(|s| s.to_string()).collect();
        let rows: Vec<Vec<String>> = rows_json
            .iter()
            .filter_map(|row| row.as_object())
            .map(|obj| {
                FIELDS
                    .iter()
                    .map(|field| {
                        obj.get(*field)
                            .map(|v| match v {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            })
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        debug!(symbol, rows = rows.len(), "Sina returned klines");
        Ok(RawTable::new(columns, rows))
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_code() {
        assert_eq!(SinaClient::full_code("510050"), "sh510050");
        assert_eq!(SinaClient::full_code("159915"), "sz159915");
        assert_eq!(SinaClient::full_code("sz.159915"), "sz159915");
    }

    #[test]
    fn test_value_as_f64() {
        assert_eq!(value_as_f64(&serde_json::json!(12.5)), Some(12.5));
        assert_eq!(value_as_f64(&serde_json::json!("12.5")), Some(12.5));
        assert_eq!(value_as_f64(&serde_json::json!(null)), None);
    }
}
