//! Price/quantity precision metadata for the active symbol, refreshed
//! hourly from the upstream exchange's `exchangeInfo` endpoint.
//!
//! The reconstruction engine itself has no use for tick size or lot step
//! — they exist for collaborators (order placement, display rounding)
//! that sit alongside this service. Kept here as an inert cache so the
//! `refresh_precision` subscriber command has something real to do.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use l3_engine::UpstreamRestClient;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::{Result, ServerError};

const REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionInfo {
    pub tick_size: Decimal,
    pub lot_step: Decimal,
}

pub struct PrecisionCache {
    rest: UpstreamRestClient,
    entries: RwLock<HashMap<String, (PrecisionInfo, Instant)>>,
}

impl PrecisionCache {
    pub fn new(rest: UpstreamRestClient) -> Self {
        Self {
            rest,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return cached precision for `symbol`, refreshing from upstream if
    /// absent or older than [`REFRESH_INTERVAL`].
    pub async fn get(&self, symbol: &str) -> Result<PrecisionInfo> {
        if let Some(info) = self.fresh_entry(symbol).await {
            return Ok(info);
        }
        self.refresh(symbol).await
    }

    /// Force a refresh regardless of cache freshness.
    pub async fn refresh(&self, symbol: &str) -> Result<PrecisionInfo> {
        let raw = self.rest.get_exchange_info(symbol).await?;
        let info = parse_precision(&raw)?;
        self.entries
            .write()
            .await
            .insert(symbol.to_string(), (info, Instant::now()));
        Ok(info)
    }

    async fn fresh_entry(&self, symbol: &str) -> Option<PrecisionInfo> {
        let entries = self.entries.read().await;
        let (info, fetched_at) = entries.get(symbol)?;
        (fetched_at.elapsed() < REFRESH_INTERVAL).then_some(*info)
    }
}

/// Binance-shaped `exchangeInfo` response: `symbols[0].filters[]` contains
/// `PRICE_FILTER.tickSize` and `LOT_SIZE.stepSize`.
fn parse_precision(raw: &serde_json::Value) -> Result<PrecisionInfo> {
    let filters = raw
        .get("symbols")
        .and_then(|s| s.get(0))
        .and_then(|s| s.get("filters"))
        .and_then(|f| f.as_array())
        .ok_or(ServerError::MissingPrecisionFilter("filters"))?;

    let tick_size = find_filter_value(filters, "PRICE_FILTER", "tickSize")
        .ok_or(ServerError::MissingPrecisionFilter("PRICE_FILTER.tickSize"))?;
    let lot_step = find_filter_value(filters, "LOT_SIZE", "stepSize")
        .ok_or(ServerError::MissingPrecisionFilter("LOT_SIZE.stepSize"))?;

    Ok(PrecisionInfo { tick_size, lot_step })
}

fn find_filter_value(filters: &[serde_json::Value], filter_type: &str, key: &str) -> Option<Decimal> {
    filters
        .iter()
        .find(|f| f.get("filterType").and_then(|t| t.as_str()) == Some(filter_type))
        .and_then(|f| f.get(key))
        .and_then(|v| v.as_str())
        .and_then(|s| {
            Decimal::from_str(s)
                .map_err(|e| warn!(filter_type, key, error = %e, "unparseable precision filter value"))
                .ok()
        })
}
