//! The per-symbol order book: owns both sides and reconstructs per-level
//! order queues from successive L2 aggregate updates.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use tracing::warn;

use crate::queue::OrderQueue;
use crate::side::{Side, SideMap};
use crate::wire::{DeltaMsg, L2SnapshotMsg, L3Level, L3Snapshot};

/// How many top levels per side carry the full `orders` breakdown in a
/// snapshot; the rest report only the aggregate fields.
const ORDERS_DETAIL_LEVELS: usize = 10;

/// Owns the bid and ask [`SideMap`]s for one symbol, plus the watermark
/// of the last applied delta.
///
/// Created empty, populated by exactly one [`load_snapshot`](Self::load_snapshot)
/// call, then mutated exclusively by [`apply_delta`](Self::apply_delta).
#[derive(Clone, Debug)]
pub struct Book {
    symbol: String,
    bids: SideMap,
    asks: SideMap,
    last_update_id: u64,
}

impl Book {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: SideMap::new(),
            asks: SideMap::new(),
            last_update_id: 0,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn last_update_id(&self) -> u64 {
        self.last_update_id
    }

    /// Replace both sides wholesale from a REST snapshot. Every level
    /// becomes a single synthetic order equal to the aggregate quantity —
    /// the starting fiction subsequent deltas refine.
    pub fn load_snapshot(&mut self, snapshot: &L2SnapshotMsg) {
        self.bids.clear();
        self.asks.clear();

        load_side(&mut self.bids, &snapshot.bids);
        load_side(&mut self.asks, &snapshot.asks);

        self.last_update_id = snapshot.last_update_id;
    }

    /// Apply one delta message, inferring add/cancel/fill events per
    /// level from the change in aggregate size.
    pub fn apply_delta(&mut self, update: &DeltaMsg) {
        apply_side_delta(&mut self.bids, &update.b);
        apply_side_delta(&mut self.asks, &update.a);

        if update.final_update_id > self.last_update_id {
            self.last_update_id = update.final_update_id;
        }
    }

    /// Snapshot the top `top_n` levels of each side.
    pub fn get_snapshot(&self, top_n: usize) -> L3Snapshot {
        L3Snapshot {
            symbol: self.symbol.clone(),
            timestamp_ms: epoch_millis(),
            bids: side_levels(&self.bids, Side::Bid, top_n),
            asks: side_levels(&self.asks, Side::Ask, top_n),
        }
    }
}

fn load_side(map: &mut SideMap, entries: &[(String, String)]) {
    for (price, qty_str) in entries {
        let Ok(qty) = Decimal::from_str(qty_str) else {
            warn!(price, qty = qty_str, "unparseable snapshot quantity, skipping level");
            continue;
        };
        if qty.is_sign_negative() || qty.is_zero() {
            continue;
        }
        map.insert(price.clone(), OrderQueue::single(qty));
    }
}

fn apply_side_delta(map: &mut SideMap, changes: &[(String, String)]) {
    for (price, qty_str) in changes {
        let Ok(new_qty) = Decimal::from_str(qty_str) else {
            warn!(price, qty = qty_str, "unparseable delta quantity, skipping change");
            continue;
        };

        if new_qty.is_sign_negative() {
            warn!(price, qty = qty_str, "negative delta quantity, skipping change");
            continue;
        }

        if new_qty.is_zero() {
            map.remove(price);
            continue;
        }

        match map.get_mut(price) {
            None => {
                map.insert(price.clone(), OrderQueue::single(new_qty));
            }
            Some(queue) => {
                let old_sum = queue.sum();
                let diff = (new_qty - old_sum).abs();

                if new_qty > old_sum {
                    queue.append(diff);
                } else if new_qty < old_sum {
                    if !queue.remove_exact(diff) {
                        queue.reduce_largest(diff);
                    }
                    map.drop_if_empty(price);
                }
                // new_qty == old_sum: no mutation.
            }
        }
    }
}

fn side_levels(map: &SideMap, side: Side, top_n: usize) -> Vec<L3Level> {
    map.ordered_prices(side)
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, (price_str, price))| {
            let queue = map.get(price_str).expect("ordered price must exist in map");
            let total_size = queue.sum();
            let order_count = queue.len();
            let max_order = queue
                .orders()
                .iter()
                .copied()
                .max()
                .unwrap_or(Decimal::ZERO);
            let avg_order = if order_count > 0 {
                total_size / Decimal::from(order_count)
            } else {
                Decimal::ZERO
            };

            L3Level {
                price,
                total_size,
                order_count,
                orders: (i < ORDERS_DETAIL_LEVELS).then(|| queue.orders().to_vec()),
                max_order,
                avg_order,
            }
        })
        .collect()
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(bids: &[(&str, &str)], asks: &[(&str, &str)]) -> L2SnapshotMsg {
        L2SnapshotMsg {
            last_update_id: 0,
            bids: bids
                .iter()
                .map(|(p, q)| (p.to_string(), q.to_string()))
                .collect(),
            asks: asks
                .iter()
                .map(|(p, q)| (p.to_string(), q.to_string()))
                .collect(),
        }
    }

    fn delta(u: u64, b: &[(&str, &str)], a: &[(&str, &str)]) -> DeltaMsg {
        DeltaMsg {
            first_update_id: u,
            final_update_id: u,
            b: b.iter().map(|(p, q)| (p.to_string(), q.to_string())).collect(),
            a: a.iter().map(|(p, q)| (p.to_string(), q.to_string())).collect(),
        }
    }

    // S1 — new level creation.
    #[test]
    fn s1_new_level_creation() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("100.00", "5")], &[]));

        let q = book.bids.get("100.00").unwrap();
        assert_eq!(q.orders(), &[dec!(5)]);
        assert_eq!(q.sum(), dec!(5));
        assert_eq!(q.len(), 1);
    }

    // S2 — net arrival.
    #[test]
    fn s2_net_arrival() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("100.00", "5")], &[]));
        book.apply_delta(&delta(2, &[("100.00", "7.5")], &[]));

        let q = book.bids.get("100.00").unwrap();
        assert_eq!(q.orders(), &[dec!(5), dec!(2.5)]);
        assert_eq!(q.len(), 2);
        assert_eq!(q.sum(), dec!(7.5));
    }

    // S3 — exact cancellation from back.
    #[test]
    fn s3_exact_cancel_from_back() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("100.00", "5")], &[]));
        book.apply_delta(&delta(2, &[("100.00", "7.5")], &[]));
        book.apply_delta(&delta(3, &[("100.00", "5")], &[]));

        let q = book.bids.get("100.00").unwrap();
        assert_eq!(q.orders(), &[dec!(5)]);
        assert_eq!(q.len(), 1);
    }

    // S4 — reduce largest when no exact match.
    #[test]
    fn s4_reduce_largest_no_exact_match() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("100.00", "5")], &[]));
        book.apply_delta(&delta(2, &[("100.00", "7.5")], &[])); // [5, 2.5]
        book.apply_delta(&delta(4, &[("100.00", "6.5")], &[])); // diff=1

        let q = book.bids.get("100.00").unwrap();
        assert_eq!(q.orders(), &[dec!(4), dec!(2.5)]);
        assert_eq!(q.len(), 2);
        assert_eq!(q.sum(), dec!(6.5));
    }

    // S5 — remove entire largest when shortfall exceeds it.
    #[test]
    fn s5_remove_largest_on_big_shortfall() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("100.00", "5")], &[]));
        book.apply_delta(&delta(2, &[("100.00", "7.5")], &[])); // [5, 2.5]
        book.apply_delta(&delta(5, &[("100.00", "0.1")], &[])); // diff=7.4

        let q = book.bids.get("100.00").unwrap();
        assert_eq!(q.orders(), &[dec!(2.5)]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.sum(), dec!(2.5)); // documented shortfall vs requested 0.1
    }

    // S6 — level deletion on zero qty.
    #[test]
    fn s6_level_deletion_on_zero() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("100.00", "5")], &[]));
        book.apply_delta(&delta(6, &[("100.00", "0")], &[]));

        assert!(book.bids.get("100.00").is_none());
    }

    // S7 — snapshot truncation and ordering.
    #[test]
    fn s7_snapshot_truncation_and_ordering() {
        let mut book = Book::new("ETHUSDT");
        book.load_snapshot(&snapshot(
            &[("101", "1"), ("99", "1"), ("100", "1")],
            &[("102", "1"), ("104", "1"), ("103", "1")],
        ));

        let snap = book.get_snapshot(2);
        let bid_prices: Vec<Decimal> = snap.bids.iter().map(|l| l.price).collect();
        let ask_prices: Vec<Decimal> = snap.asks.iter().map(|l| l.price).collect();

        assert_eq!(bid_prices, vec![dec!(101), dec!(100)]);
        assert_eq!(ask_prices, vec![dec!(102), dec!(103)]);
        for level in snap.bids.iter().chain(snap.asks.iter()) {
            assert_eq!(level.orders.as_deref(), Some(&[dec!(1)][..]));
        }
    }

    #[test]
    fn absent_level_with_nonzero_qty_creates_it() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("50.00", "3")], &[]));
        assert!(book.bids.get("50.00").is_some());
    }

    #[test]
    fn absent_level_with_zero_qty_is_noop() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("50.00", "0")], &[]));
        assert!(book.bids.get("50.00").is_none());
    }

    #[test]
    fn negative_qty_against_absent_level_is_noop() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("50.00", "-5")], &[]));
        assert!(book.bids.get("50.00").is_none());
    }

    #[test]
    fn negative_qty_against_present_level_leaves_it_untouched() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("100.00", "5")], &[]));
        book.apply_delta(&delta(2, &[("100.00", "-5")], &[]));

        let q = book.bids.get("100.00").unwrap();
        assert_eq!(q.orders(), &[dec!(5)]);
    }

    #[test]
    fn parse_failure_skips_one_change_not_the_batch() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("50.00", "not-a-number"), ("51.00", "3")], &[]));
        assert!(book.bids.get("50.00").is_none());
        assert!(book.bids.get("51.00").is_some());
    }

    #[test]
    fn load_snapshot_is_idempotent() {
        let mut book = Book::new("ETHUSDT");
        let snap = snapshot(&[("100", "5")], &[("101", "5")]);
        book.load_snapshot(&snap);
        let first = book.get_snapshot(10);
        book.load_snapshot(&snap);
        let second = book.get_snapshot(10);

        assert_eq!(first.bids, second.bids);
        assert_eq!(first.asks, second.asks);
    }

    #[test]
    fn last_update_id_only_advances() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(5, &[], &[]));
        assert_eq!(book.last_update_id(), 5);
        book.apply_delta(&delta(3, &[], &[]));
        assert_eq!(book.last_update_id(), 5, "stale update id must not regress the watermark");
    }

    #[test]
    fn distinct_string_price_forms_are_not_renormalized() {
        let mut book = Book::new("ETHUSDT");
        book.apply_delta(&delta(1, &[("10.0", "1"), ("10.00", "2")], &[]));
        assert!(book.bids.get("10.0").is_some());
        assert!(book.bids.get("10.00").is_some());
        assert_eq!(book.bids.len(), 2);
    }
}
