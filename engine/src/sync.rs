//! Feed synchronizer: drives a [`Book`] from the upstream snapshot+delta
//! feed, reconnecting and resyncing on failure, and stopping promptly on
//! cancellation.
//!
//! State machine (see `spec.md` §4.4):
//!
//! ```text
//! Idle -> Dialing -> Snapshotting -> Live -> Backoff -> Dialing -> ...
//!           ^             |            |
//!           |             v            v
//!           +--------- Cancelled <-----+
//! ```
//!
//! Built the way `nord::orderbook::run_background_task` and
//! `binance-feed::feed::run_feed`/`run_single_connection` build their
//! reconnect loops: an outer loop over named states, a
//! `tokio_util::sync::CancellationToken` polled at every state entry and
//! every `Live`-loop iteration, and `tracing` for each transition.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::book::Book;
use crate::rest::UpstreamRestClient;
use crate::ws::UpstreamWsClient;

/// REST read timeout is enforced inside [`UpstreamRestClient`]; these are
/// the synchronizer's own state-machine timing constants.
const READ_DEADLINE: Duration = Duration::from_secs(1);
const BACKOFF_DELAY: Duration = Duration::from_secs(5);
const SNAPSHOT_RETRY_DELAY: Duration = Duration::from_millis(200);
const SNAPSHOT_LIMIT: u32 = 1000;

/// Base URLs for the upstream exchange's WS and REST endpoints.
#[derive(Debug, Clone)]
pub struct UpstreamEndpoints {
    /// e.g. `wss://fstream.binance.com` — `/ws/{symbol}@depth` is appended.
    pub ws_base: String,
    /// e.g. `https://fapi.binance.com/fapi/v1` — `/depth` is appended.
    pub rest_base: String,
}

impl Default for UpstreamEndpoints {
    fn default() -> Self {
        Self {
            ws_base: "wss://fstream.binance.com".to_string(),
            rest_base: "https://fapi.binance.com/fapi/v1".to_string(),
        }
    }
}

fn build_ws_url(ws_base: &str, symbol: &str) -> String {
    format!("{}/ws/{}@depth", ws_base.trim_end_matches('/'), symbol.to_lowercase())
}

enum SyncState {
    Dialing,
    Snapshotting(UpstreamWsClient),
    Live(UpstreamWsClient),
    Backoff,
    Cancelled,
}

/// Drives one [`Book`] for one symbol. One synchronizer exists per live
/// Book; the controller cancels it and drops it on symbol switch.
pub struct FeedSynchronizer {
    symbol: String,
    endpoints: UpstreamEndpoints,
    book: Arc<RwLock<Book>>,
    cancel: CancellationToken,
    rest: UpstreamRestClient,
}

impl FeedSynchronizer {
    pub fn new(
        symbol: String,
        book: Arc<RwLock<Book>>,
        cancel: CancellationToken,
        endpoints: UpstreamEndpoints,
    ) -> Self {
        let rest = UpstreamRestClient::new(endpoints.rest_base.clone());
        Self {
            symbol,
            endpoints,
            book,
            cancel,
            rest,
        }
    }

    /// Run the state machine to completion (i.e. until cancelled).
    pub async fn run(self) {
        let ws_url = build_ws_url(&self.endpoints.ws_base, &self.symbol);
        let mut state = SyncState::Dialing;

        loop {
            state = match state {
                SyncState::Dialing => self.enter_dialing(&ws_url).await,
                SyncState::Snapshotting(ws) => self.enter_snapshotting(ws).await,
                SyncState::Live(ws) => self.enter_live(ws).await,
                SyncState::Backoff => self.enter_backoff().await,
                SyncState::Cancelled => {
                    info!(symbol = %self.symbol, "synchronizer cancelled, exiting");
                    break;
                }
            };
        }
    }

    async fn enter_dialing(&self, ws_url: &str) -> SyncState {
        if self.cancel.is_cancelled() {
            return SyncState::Cancelled;
        }
        info!(symbol = %self.symbol, url = ws_url, "dialing upstream feed");
        match UpstreamWsClient::connect(ws_url).await {
            Ok(ws) => SyncState::Snapshotting(ws),
            Err(e) => {
                warn!(symbol = %self.symbol, error = %e, "dial failed");
                SyncState::Backoff
            }
        }
    }

    async fn enter_snapshotting(&self, ws: UpstreamWsClient) -> SyncState {
        if self.cancel.is_cancelled() {
            ws.close().await;
            return SyncState::Cancelled;
        }
        match self.rest.get_snapshot(&self.symbol, SNAPSHOT_LIMIT).await {
            Ok(snapshot) => {
                let mut book = self.book.write().await;
                book.load_snapshot(&snapshot);
                info!(
                    symbol = %self.symbol,
                    last_update_id = book.last_update_id(),
                    "snapshot loaded"
                );
                drop(book);
                SyncState::Live(ws)
            }
            Err(e) => {
                warn!(symbol = %self.symbol, error = %e, "snapshot fetch failed, retrying");
                tokio::select! {
                    () = tokio::time::sleep(SNAPSHOT_RETRY_DELAY) => SyncState::Snapshotting(ws),
                    () = self.cancel.cancelled() => {
                        ws.close().await;
                        SyncState::Cancelled
                    }
                }
            }
        }
    }

    async fn enter_live(&self, mut ws: UpstreamWsClient) -> SyncState {
        if self.cancel.is_cancelled() {
            ws.close().await;
            return SyncState::Cancelled;
        }
        match ws.next_delta(READ_DEADLINE).await {
            Ok(Some(delta)) => {
                self.book.write().await.apply_delta(&delta);
                SyncState::Live(ws)
            }
            // Read timeout is expected — not an error, stay in Live and
            // re-check cancellation on the next loop iteration.
            Ok(None) => SyncState::Live(ws),
            Err(e) => {
                warn!(symbol = %self.symbol, error = %e, "live connection error");
                SyncState::Backoff
            }
        }
    }

    async fn enter_backoff(&self) -> SyncState {
        if self.cancel.is_cancelled() {
            return SyncState::Cancelled;
        }
        warn!(symbol = %self.symbol, delay = ?BACKOFF_DELAY, "backing off before reconnect");
        tokio::select! {
            () = tokio::time::sleep(BACKOFF_DELAY) => SyncState::Dialing,
            () = self.cancel.cancelled() => SyncState::Cancelled,
        }
    }
}
