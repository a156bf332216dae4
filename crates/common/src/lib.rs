//! Shared identifier types for the order engine.
//!
//! Business records are keyed by human-readable numbers (`ORD…`, `RES…`)
//! rather than surrogate database ids; wrapping them keeps the different
//! number families from being mixed up at compile time.

mod types;

pub use types::{OrderNo, ProductId, RefundNo, ReserveId, TaskId, UserId};
