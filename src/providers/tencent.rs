use crate::error::{Error, Result};
use crate::models::DataKind;
use crate::providers::{exchange_prefix, pure_code, HttpFetcher, ProviderClient, RawTable};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

const BASE_URL: &str = "https://web.ifzq.gtimg.cn/appstock/app/fqkline/get";

/// Tencent daily kline endpoint (second fallback vendor)
///
/// Bars come back as positional arrays `[date, open, close, high, low,
/// volume]` under `data.<code>.qfqday` (adjusted) or `data.<code>.day`.
pub struct TencentClient {
    http: Arc<HttpFetcher>,
}

impl TencentClient {
    pub fn new(http: Arc<HttpFetcher>) -> Self {
        Self { http }
    }

    fn full_code(symbol: &str) -> String {
        let code = pure_code(symbol);
        format!("{}{}", exchange_prefix(code), code)
    }
}

#[async_trait]
impl ProviderClient for TencentClient {
    fn name(&self) -> &'static str {
        "tencent"
    }

    async fn fetch(
        &self,
        symbol: &str,
        kind: DataKind,
        since: Option<NaiveDate>,
    ) -> Result<RawTable> {
        let full_code = Self::full_code(symbol);
        let start = since
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        let url = format!(
            "{}?param={},day,{},,{},qfq",
            BASE_URL,
            full_code,
            start,
            kind.fetch_depth()
        );

        let payload = self.http.get_json(self.name(), &url).await?;

        let kline = payload
            .get("data")
            .and_then(|d| d.get(&full_code))
            .and_then(|d| d.get("qfqday").or_else(|| d.get("day")))
            .and_then(|k| k.as_array())
            .ok_or_else(|| {
                Error::SchemaMismatch(format!("{}: missing kline data for {}", self.name(), symbol))
            })?;

        let columns = vec![
            "date".to_string(),
            "open".to_string(),
            "close".to_string(),
            "high".to_string(),
            "low".to_string(),
            "volume".to_string(),
        ];

        let rows: Vec<Vec<String>> = kline
            .iter()
            .filter_map(|row| row.as_array())
            .map(|row| {
                row.iter()
                    .take(6)
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect();

        debug!(symbol, rows = rows.len(), "Tencent returned klines");
        Ok(RawTable::new(columns, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_code() {
        assert_eq!(TencentClient::full_code("588000"), "sh588000");
        assert_eq!(TencentClient::full_code("159825"), "sz159825");
    }
}
