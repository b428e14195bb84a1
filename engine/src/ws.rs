//! WebSocket client for the upstream exchange's delta stream.
//!
//! Grounded on `nord::ws::NordWebSocketClient`'s connect/ping/pong loop and
//! `binance-feed::feed::run_single_connection`'s read-with-deadline idiom,
//! generalized from broadcast fan-out to a single-consumer delta reader
//! since the feed synchronizer is this client's only caller.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::wire::DeltaMsg;

/// A connected upstream delta-stream socket.
pub struct UpstreamWsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl UpstreamWsClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        Ok(Self { stream })
    }

    /// Wait up to `deadline` for the next delta. A read timeout is not an
    /// error — it returns `Ok(None)` so the synchronizer can re-check its
    /// cancellation signal and loop, per the ~1s `Live`-state read
    /// deadline in the synchronizer's state machine.
    pub async fn next_delta(&mut self, deadline: Duration) -> Result<Option<DeltaMsg>> {
        loop {
            let frame = match tokio::time::timeout(deadline, self.stream.next()).await {
                Err(_elapsed) => return Ok(None),
                Ok(frame) => frame,
            };

            match frame {
                None => return Err(EngineError::ConnectionClosed),
                Some(Err(e)) => return Err(EngineError::WebSocket(e)),
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<DeltaMsg>(&text) {
                    Ok(delta) => return Ok(Some(delta)),
                    Err(e) => {
                        warn!(error = %e, "unparseable delta frame, skipping");
                        continue;
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    let _ = self.stream.send(Message::Pong(data)).await;
                    continue;
                }
                Some(Ok(Message::Close(_))) => return Err(EngineError::ConnectionClosed),
                Some(Ok(_)) => continue,
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
