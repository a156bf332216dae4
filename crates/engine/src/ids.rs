//! Business-number generation.
//!
//! Numbers are a prefix, a UTC second timestamp and a 4-digit random
//! suffix (`ORD20250807093015 0042`). Collisions within one second are
//! possible, so insertion sites check uniqueness and regenerate on
//! conflict.

use chrono::Utc;
use common::{OrderNo, RefundNo, ReserveId, TaskId};
use rand::Rng;
use uuid::Uuid;

fn numbered(prefix: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{prefix}{timestamp}{suffix:04}")
}

/// Generates a new order number (`ORD…`).
pub fn order_no() -> OrderNo {
    OrderNo::new(numbered("ORD"))
}

/// Generates a new reservation id (`RES…`).
pub fn reserve_id() -> ReserveId {
    ReserveId::new(numbered("RES"))
}

/// Generates a new refund number (`REF…`).
pub fn refund_no() -> RefundNo {
    RefundNo::new(numbered("REF"))
}

/// Generates a new timeout task id (`TASK…`).
pub fn task_id() -> TaskId {
    TaskId::new(numbered("TASK"))
}

/// Generates a payment number for payments arriving without one.
pub fn payment_no() -> String {
    format!("PAY{}", Utc::now().timestamp())
}

/// Builds the payment link returned from order creation; the token is
/// opaque to this system.
pub fn payment_url(base: &str, order_no: &OrderNo) -> String {
    format!("{base}?order_no={order_no}&token={}", Uuid::new_v4().simple())
}
