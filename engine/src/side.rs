//! One side (bids or asks) of a [`Book`](crate::book::Book): a price-keyed
//! map of [`OrderQueue`]s plus the ordering needed to emit a snapshot.

use std::str::FromStr;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use tracing::warn;

use crate::queue::OrderQueue;

/// Which side of the book a [`SideMap`] represents. Determines snapshot
/// ordering direction: bids descending, asks ascending.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

/// Price-keyed collection of [`OrderQueue`]s for one side of one symbol.
///
/// Keys are the exchange's canonical price strings, kept verbatim — never
/// renormalized, never hashed by parsed numeric value. Empty queues are
/// never retained: callers must call [`SideMap::remove`] once a queue
/// empties out.
#[derive(Clone, Debug, Default)]
pub struct SideMap {
    levels: IndexMap<String, OrderQueue>,
}

impl SideMap {
    pub fn new() -> Self {
        Self {
            levels: IndexMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }

    pub fn get(&self, price: &str) -> Option<&OrderQueue> {
        self.levels.get(price)
    }

    pub fn get_mut(&mut self, price: &str) -> Option<&mut OrderQueue> {
        self.levels.get_mut(price)
    }

    pub fn contains(&self, price: &str) -> bool {
        self.levels.contains_key(price)
    }

    pub fn insert(&mut self, price: String, queue: OrderQueue) {
        self.levels.insert(price, queue);
    }

    /// Remove the level entirely, regardless of whether it existed.
    pub fn remove(&mut self, price: &str) {
        self.levels.shift_remove(price);
    }

    /// Drop the level if its queue has emptied out. Call after any
    /// mutation that may have removed the last order at a level.
    pub fn drop_if_empty(&mut self, price: &str) {
        if self.levels.get(price).is_some_and(OrderQueue::is_empty) {
            self.levels.shift_remove(price);
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Price keys paired with their parsed decimal value, ordered for
    /// snapshot emission: descending for bids, ascending for asks.
    ///
    /// A key that fails to parse as a decimal is skipped with a warning —
    /// the exchange is assumed to emit one canonical numeric form per
    /// level, so this should never trigger in practice.
    pub fn ordered_prices(&self, side: Side) -> Vec<(&str, Decimal)> {
        let mut out: Vec<(&str, Decimal)> = self
            .levels
            .keys()
            .filter_map(|key| match Decimal::from_str(key) {
                Ok(price) => Some((key.as_str(), price)),
                Err(e) => {
                    warn!(price = key, error = %e, "unparseable price key, skipping in snapshot");
                    None
                }
            })
            .collect();

        match side {
            Side::Bid => out.sort_by(|a, b| b.1.cmp(&a.1)),
            Side::Ask => out.sort_by(|a, b| a.1.cmp(&b.1)),
        }
        out
    }
}
