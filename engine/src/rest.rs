//! HTTP client for the upstream exchange's REST snapshot endpoint.

use std::time::Duration;

use reqwest::Client;

use crate::error::{EngineError, Result};
use crate::wire::L2SnapshotMsg;

const REST_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin wrapper over `reqwest::Client` scoped to one upstream REST base
/// URL, matching `nord::rest::NordHttpClient`'s shape.
#[derive(Debug, Clone)]
pub struct UpstreamRestClient {
    client: Client,
    base_url: String,
}

impl UpstreamRestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REST_TIMEOUT)
            .build()
            .expect("reqwest client build with static config cannot fail");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `GET /depth?symbol=...&limit=...` — the order book depth snapshot.
    pub async fn get_snapshot(&self, symbol: &str, limit: u32) -> Result<L2SnapshotMsg> {
        let url = format!("{}/depth", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("limit", &limit.to_string())])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::Http { status, body });
        }

        let snapshot: L2SnapshotMsg = resp.json().await?;
        if snapshot.last_update_id == 0 {
            return Err(EngineError::InvalidSnapshot);
        }
        Ok(snapshot)
    }

    /// `GET /exchangeInfo?symbol=...` — raw JSON for the precision cache.
    /// Returned as `serde_json::Value` since the precision cache lives in
    /// the `server` crate and owns its own narrower type.
    pub async fn get_exchange_info(&self, symbol: &str) -> Result<serde_json::Value> {
        let url = format!("{}/exchangeInfo", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::Http { status, body });
        }

        Ok(resp.json().await?)
    }
}
