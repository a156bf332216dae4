//! Record stores for the order engine.
//!
//! Each of the five record families (orders + their items, stock
//! reservations, refund orders, timeout tasks) has its own store trait.
//! Atomicity is guaranteed only within a single store operation; there is
//! no cross-store transaction, so callers must not assume one.
//!
//! The sole primitive for changing a record's status is `transition`: a
//! compare-and-set that succeeds only while the current status matches the
//! caller's expectation and fails with [`StoreError::StaleStatus`] once the
//! record has moved on. Competing writers race to exactly one winner.

pub mod error;
pub mod memory;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{
    InMemoryOrderStore, InMemoryRefundStore, InMemoryReservationStore, InMemoryTimeoutTaskStore,
};
pub use query::{OrderFilter, TimeRange};
pub use store::{
    OrderStore, OrderUpdate, RefundStore, RefundUpdate, ReservationStore, Stores, TimeoutTaskStore,
};
