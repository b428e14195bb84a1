//! Owns the currently-active [`Book`] and its [`FeedSynchronizer`], and
//! performs the atomic swap when a subscriber requests a symbol switch.
//!
//! Two separate locks are at play here, deliberately: the `Book` itself
//! is behind its own `RwLock` (readers are the publisher ticking 20 times
//! a second; the writer is the synchronizer applying deltas), while the
//! controller's *cell* — which `Book`/cancel-token pair is current — is
//! behind a second, outer `RwLock` taken only around a switch. Conflating
//! the two would mean every publisher tick blocks symbol switches and
//! vice versa.

use std::sync::Arc;

use l3_engine::{Book, FeedSynchronizer, UpstreamEndpoints};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

struct ActiveSymbol {
    symbol: String,
    book: Arc<RwLock<Book>>,
    cancel: CancellationToken,
}

pub struct Controller {
    active: RwLock<ActiveSymbol>,
    endpoints: UpstreamEndpoints,
}

impl Controller {
    /// Build the controller and spawn the synchronizer for `initial_symbol`.
    pub fn new(initial_symbol: impl Into<String>, endpoints: UpstreamEndpoints) -> Self {
        let symbol = initial_symbol.into().to_uppercase();
        let book = Arc::new(RwLock::new(Book::new(symbol.clone())));
        let cancel = CancellationToken::new();

        spawn_synchronizer(symbol.clone(), book.clone(), cancel.clone(), endpoints.clone());

        Self {
            active: RwLock::new(ActiveSymbol { symbol, book, cancel }),
            endpoints,
        }
    }

    pub async fn current_book(&self) -> Arc<RwLock<Book>> {
        self.active.read().await.book.clone()
    }

    pub async fn current_symbol(&self) -> String {
        self.active.read().await.symbol.clone()
    }

    /// Cancel the running synchronizer, start a fresh one for `new_symbol`
    /// against an empty book, and swap it in. A no-op if `new_symbol`
    /// (case-insensitive) is already active.
    pub async fn switch_symbol(&self, new_symbol: &str) {
        let new_symbol = new_symbol.to_uppercase();
        let mut active = self.active.write().await;
        if active.symbol == new_symbol {
            return;
        }

        active.cancel.cancel();

        let book = Arc::new(RwLock::new(Book::new(new_symbol.clone())));
        let cancel = CancellationToken::new();
        spawn_synchronizer(new_symbol.clone(), book.clone(), cancel.clone(), self.endpoints.clone());

        info!(from = %active.symbol, to = %new_symbol, "switched active symbol");
        *active = ActiveSymbol { symbol: new_symbol, book, cancel };
    }
}

fn spawn_synchronizer(
    symbol: String,
    book: Arc<RwLock<Book>>,
    cancel: CancellationToken,
    endpoints: UpstreamEndpoints,
) {
    let synchronizer = FeedSynchronizer::new(symbol, book, cancel, endpoints);
    tokio::spawn(synchronizer.run());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn switch_to_same_symbol_is_noop() {
        let controller = Controller::new("ethusdt", UpstreamEndpoints::default());
        let before = controller.current_symbol().await;
        controller.switch_symbol("ETHUSDT").await;
        let after = controller.current_symbol().await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn switch_to_new_symbol_replaces_book() {
        let controller = Controller::new("ethusdt", UpstreamEndpoints::default());
        let first_book = controller.current_book().await;
        controller.switch_symbol("btcusdt").await;
        assert_eq!(controller.current_symbol().await, "BTCUSDT");
        let second_book = controller.current_book().await;
        assert!(!Arc::ptr_eq(&first_book, &second_book));
    }
}
