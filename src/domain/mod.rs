//! Exchange-agnostic domain logic.

mod guard;
mod id;
mod order;
mod position;
mod snapshot;
mod status;
mod target;

pub use guard::{GuardStateMachine, GuardStatus, Transition};
pub use id::{OrderId, SubscriptionId};
pub use order::{OrderKind, OrderRecord, OrderSide, OrderSpec, ProtectiveKind, ProtectiveOrder};
pub use position::{Direction, Position, FLAT_EPSILON};
pub use snapshot::{Snapshot, TradeLog, TradeLogEntry, TradeLogKind};
pub use status::is_order_active;
pub use target::{
    compute_targets, round_to_tick, ProtectionTargets, RiskParams, StopDistance, TrailingParams,
};
