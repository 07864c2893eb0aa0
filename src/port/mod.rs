//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! - [`ExchangeAdapter`] - venue integration: event streams and order actions
//! - [`NotFoundSignature`] - how a venue says "no such order"
//! - [`SnapshotObserver`] - receives a snapshot after every pass

mod exchange;
mod not_found;
mod observer;

pub use exchange::{
    AdapterEvent, EventKind, EventSink, ExchangeAdapter, PositionUpdate, PriceTick,
};
pub use not_found::{ErrorClass, NotFoundSignature};
pub use observer::SnapshotObserver;
