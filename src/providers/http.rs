use crate::error::{Error, Result};
use isahc::{config::Configurable, prelude::*, HttpClient};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Shared HTTP fetcher for all vendor adapters
///
/// One client, per-request timeout, bounded retries with exponential
/// backoff and jitter. Non-2xx responses and network errors are retried;
/// a body that is not JSON is handed back as a parse failure so the
/// caller can classify it.
pub struct HttpFetcher {
    client: HttpClient,
    max_retries: u32,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .default_header("User-Agent", USER_AGENT)
            .default_header("Accept", "application/json, text/plain, */*")
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries,
        })
    }

    /// GET a URL and return the raw body text
    pub async fn get_text(&self, vendor: &str, url: &str) -> Result<String> {
        let mut last_error = String::new();

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs_f64(
                    2.0_f64.powi(attempt as i32 - 1) + rand::random::<f64>(),
                );
                info!(
                    vendor,
                    attempt = attempt + 1,
                    max = self.max_retries,
                    reason = %last_error,
                    wait_secs = delay.as_secs_f64(),
                    "Retrying vendor request after backoff"
                );
                sleep(delay).await;
            }

            debug!(vendor, url, attempt = attempt + 1, "Sending vendor request");

            match self.client.get_async(url).await {
                Ok(mut response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.text().await {
                            Ok(body) => return Ok(body),
                            Err(e) => {
                                last_error = format!("Response body error: {}", e);
                                continue;
                            }
                        }
                    }
                    last_error = format!(
                        "HTTP {} - {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown")
                    );
                }
                Err(e) => {
                    last_error = format!("Network error: {}", e);
                }
            }
        }

        Err(Error::VendorUnavailable(format!(
            "{}: {} (after {} attempts)",
            vendor, last_error, self.max_retries
        )))
    }

    /// GET a URL and parse the body as JSON
    pub async fn get_json(&self, vendor: &str, url: &str) -> Result<Value> {
        let body = self.get_text(vendor, url).await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::SchemaMismatch(format!("{}: invalid JSON response: {}", vendor, e)))
    }
}
