//! Domain layer for the order lifecycle and compensation engine.
//!
//! This crate holds the pure model: fixed-point money, the record types
//! persisted by the stores, the status state machines governing which
//! transitions are legal, and the error taxonomy every operation reports
//! through. It performs no IO; enforcement of the transition rules happens
//! in the store layer via conditional updates.

pub mod error;
pub mod money;
pub mod records;
pub mod status;

pub use error::OrderError;
pub use money::Money;
pub use records::{Order, OrderItem, RefundOrder, StockReservation, TimeoutTask};
pub use status::{OrderStatus, RefundStatus, ReservationStatus, TaskStatus, TimeoutKind};
