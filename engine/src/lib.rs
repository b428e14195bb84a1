//! L2-to-L3 order book reconstruction engine.
//!
//! Estimates a per-order (L3) view of an exchange's limit order book from
//! a stream of per-price-level aggregate (L2) updates: for each price
//! level, a synthetic queue of order quantities whose sum tracks the
//! aggregate broadcast by the exchange, refined by inferring add/cancel/
//! fill events from successive aggregate changes.
//!
//! Module layout mirrors the dependency order in `spec.md` §2:
//! [`queue`] ← [`side`] ← [`book`] ← [`sync`], with [`wire`], [`rest`],
//! and [`ws`] as supporting collaborators.

pub mod book;
pub mod error;
pub mod queue;
pub mod rest;
pub mod side;
pub mod sync;
pub mod wire;
pub mod ws;

pub use book::Book;
pub use error::{EngineError, Result};
pub use queue::OrderQueue;
pub use rest::UpstreamRestClient;
pub use side::{Side, SideMap};
pub use sync::{FeedSynchronizer, UpstreamEndpoints};
pub use wire::{
    DeltaMsg, L2SnapshotMsg, L3Level, L3Snapshot, L3UpdateEnvelope, SubscriberCommand,
    SubscriberResponse,
};
pub use ws::UpstreamWsClient;
