//! Broker order-status classification.
//!
//! Venues disagree on status vocabulary (`CANCELED` vs `CANCELLED`,
//! `closed_by_user`, `waiting_price`, ...). The guardian only needs to know
//! whether an order can still protect the position, so every status string
//! collapses to active or terminal here.

/// Statuses that end an order's life, compared after normalization.
const TERMINAL_STATUSES: [&str; 6] = [
    "FILLED",
    "CANCELED",
    "CANCELLED",
    "REJECTED",
    "EXPIRED",
    "TRIGGERED",
];

/// Returns `true` unless the status is known to be terminal.
///
/// Missing, empty, and whitespace-only statuses count as active: an order the
/// venue lists without a status is assumed to still be working.
#[must_use]
pub fn is_order_active(status: Option<&str>) -> bool {
    let Some(status) = status else {
        return true;
    };
    let normalized = status.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return true;
    }
    if normalized.contains("CLOSED") {
        return false;
    }
    !TERMINAL_STATUSES.contains(&normalized.as_str())
}
