//! Per-subscriber push loop: ticks at 20 Hz, reads the controller's
//! current book, and forwards an `l3_update` envelope.
//!
//! Tick-loop shape is the same idiom `zo::monitor`'s render loop uses for
//! its 10 FPS redraw, generalized to the downstream publish rate.

use std::sync::Arc;
use std::time::Duration;

use l3_engine::L3UpdateEnvelope;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::controller::Controller;

const TICK_INTERVAL: Duration = Duration::from_millis(50);
const TOP_N_LEVELS: usize = 100;

/// Runs until the subscriber's outbound channel is closed or a send
/// fails, at which point the task exits and the connection is torn down.
pub async fn run(controller: Arc<Controller>, outbound: mpsc::Sender<axum::extract::ws::Message>) {
    let mut tick = tokio::time::interval(TICK_INTERVAL);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tick.tick().await;

        let book = controller.current_book().await;
        let snapshot = book.read().await.get_snapshot(TOP_N_LEVELS);
        let envelope = L3UpdateEnvelope::new(snapshot);

        let payload = match serde_json::to_string(&envelope) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize l3_update, skipping tick");
                continue;
            }
        };

        if outbound
            .send(axum::extract::ws::Message::Text(payload.into()))
            .await
            .is_err()
        {
            debug!("subscriber channel closed, stopping publisher");
            break;
        }
    }
}
