//! Per-level order queue: a synthetic FIFO of individual order quantities
//! whose sum tracks the aggregate size broadcast for one price level.

use rust_decimal::Decimal;

/// Ordered sequence of positive quantities for one (side, price) level.
///
/// Index 0 is the oldest order. Every entry is strictly positive; the
/// queue is only transiently empty during removal, before the caller
/// deletes the level from its [`SideMap`](crate::side::SideMap).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderQueue {
    orders: Vec<Decimal>,
}

impl OrderQueue {
    /// A queue containing a single synthetic order of the given quantity.
    pub fn single(qty: Decimal) -> Self {
        Self { orders: vec![qty] }
    }

    /// Exact sum of all entries. O(n).
    pub fn sum(&self) -> Decimal {
        self.orders.iter().sum()
    }

    /// Individual order quantities, oldest first.
    pub fn orders(&self) -> &[Decimal] {
        &self.orders
    }

    /// Number of resting orders at this level.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Push a new order to the back of the FIFO.
    ///
    /// `q` must be strictly positive; this is a precondition, not a
    /// checked error, since callers only ever derive `q` from a positive
    /// diff.
    pub fn append(&mut self, q: Decimal) {
        debug_assert!(q.is_sign_positive() && !q.is_zero());
        self.orders.push(q);
    }

    /// Remove the first entry equal to `d`, scanning from the back.
    ///
    /// A cancellation is more likely to target a recently placed order
    /// than an ancient one; the back-to-front scan direction is a
    /// deliberate tie-break and must not be reordered.
    pub fn remove_exact(&mut self, d: Decimal) -> bool {
        if let Some(idx) = self.orders.iter().rposition(|&q| q == d) {
            self.orders.remove(idx);
            true
        } else {
            false
        }
    }

    /// Index of the largest entry; on ties, the lowest index (oldest)
    /// wins. `None` if the queue is empty.
    pub fn largest_index(&self) -> Option<usize> {
        self.orders
            .iter()
            .enumerate()
            .max_by(|(ai, a), (bi, b)| a.cmp(b).then(bi.cmp(ai)))
            .map(|(i, _)| i)
    }

    /// Absorb a shortfall of `d` into the largest resting order.
    ///
    /// If the largest order exceeds `d`, it is reduced by `d`. Otherwise
    /// the largest order is removed entirely and any remainder of `d` is
    /// silently dropped — the book accepts momentary drift and lets the
    /// next delta touching this level self-correct (see reconstruction
    /// shortfall in the book module).
    pub fn reduce_largest(&mut self, d: Decimal) {
        let Some(idx) = self.largest_index() else {
            return;
        };
        if self.orders[idx] > d {
            self.orders[idx] -= d;
        } else {
            self.orders.remove(idx);
        }
    }
}
