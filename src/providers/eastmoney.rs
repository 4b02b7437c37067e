use crate::error::{Error, Result};
use crate::models::DataKind;
use crate::providers::{exchange_prefix, pure_code, HttpFetcher, ProviderClient, RawTable};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

const BASE_URL: &str = "http://push2his.eastmoney.com/api/qt/stock/kline/get";

/// Eastmoney kline endpoint (primary vendor)
///
/// Returns bars as comma-joined strings under `data.klines`; field order
/// is fixed by the `fields2` request parameter. The adapter re-labels the
/// table with the vendor's Chinese column names and leaves normalization
/// to the chain.
pub struct EastmoneyClient {
    http: Arc<HttpFetcher>,
}

impl EastmoneyClient {
    pub fn new(http: Arc<HttpFetcher>) -> Self {
        Self { http }
    }

    fn secid(symbol: &str) -> String {
        let code = pure_code(symbol);
        let market = if exchange_prefix(code) == "sh" { "1" } else { "0" };
        format!("{}.{}", market, code)
    }
}

#[async_trait]
impl ProviderClient for EastmoneyClient {
    fn name(&self) -> &'static str {
        "eastmoney"
    }

    async fn fetch(
        &self,
        symbol: &str,
        kind: DataKind,
        since: Option<NaiveDate>,
    ) -> Result<RawTable> {
        let beg = match since {
            Some(date) => date.format("%Y%m%d").to_string(),
            None => "0".to_string(),
        };

        let url = format!(
            "{}?secid={}&fields1=f1,f2,f3,f4,f5&fields2=f51,f52,f53,f54,f55,f56\
             &klt=101&fqt=1&beg={}&end=20500101&lmt={}",
            BASE_URL,
            Self::secid(symbol),
            beg,
            kind.fetch_depth(),
        );

        let payload = self.http.get_json(self.name(), &url).await?;

        let klines = payload
            .get("data")
            .and_then(|d| d.get("klines"))
            .and_then(|k| k.as_array())
            .ok_or_else(|| {
                Error::SchemaMismatch(format!("{}: missing data.klines for {}", self.name(), symbol))
            })?;

        // fields2=f51..f56 -> date,open,close,high,low,volume
        let columns = vec![
            "日期".to_string(),
            "开盘".to_string(),
            "收盘".to_string(),
            "最高".to_string(),
            "最低".to_string(),
            "成交量".to_string(),
        ];

        let rows: Vec<Vec<String>> = klines
            .iter()
            .filter_map(|line| line.as_str())
            .map(|line| line.split(',').take(6).map(|s| s.to_string()).collect())
            .collect();

        debug!(symbol, rows = rows.len(), "Eastmoney returned klines");
        Ok(RawTable::new(columns, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secid_market() {
        assert_eq!(EastmoneyClient::secid("510300"), "1.510300");
        assert_eq!(EastmoneyClient::secid("159995"), "0.159995");
        assert_eq!(EastmoneyClient::secid("sh.510050"), "1.510050");
    }
}
