//! Status state machines for orders, reservations, refunds and timeout tasks.

use serde::{Deserialize, Serialize};

/// The state of an order in its lifecycle.
///
/// Allowed transitions:
/// ```text
/// pending ──► paid ──► shipped ──► completed ──► refunded
///    │          │                      ▲             ▲
///    │          ├──────────────────────┼─────────────┘
///    └──────────┴──► cancelled         (rejected refund restores)
/// ```
/// `cancelled` and `refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, awaiting payment.
    #[default]
    Pending,

    /// Payment received, awaiting shipment.
    Paid,

    /// Handed to logistics, awaiting receipt confirmation.
    Shipped,

    /// Receipt confirmed by the buyer.
    Completed,

    /// Cancelled before shipment (terminal).
    Cancelled,

    /// Refund in flight or settled (terminal).
    Refunded,
}

impl OrderStatus {
    /// Returns true if the order can accept payment.
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }

    /// Returns true if the order can be shipped.
    pub fn can_ship(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if receipt can be confirmed.
    pub fn can_confirm_receipt(&self) -> bool {
        matches!(self, OrderStatus::Shipped)
    }

    /// Returns true if a refund can be applied for.
    pub fn can_refund(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Shipped | OrderStatus::Completed
        )
    }

    /// Returns true if no further transition is permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// All statuses, for per-status aggregation.
    pub fn all() -> [OrderStatus; 6] {
        [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ]
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The state of a stock reservation.
///
/// A reservation is a time-bounded hold: only `reserved` may move, and it
/// moves exactly once, to `confirmed`, `released` or `expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Stock is held, awaiting confirmation or release.
    #[default]
    Reserved,

    /// Hold converted into a real deduction (terminal).
    Confirmed,

    /// Hold given back, e.g. on cancellation (terminal).
    Released,

    /// Hold lapsed past its expiry (terminal).
    Expired,
}

impl ReservationStatus {
    /// Returns true once the reservation can no longer move.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Reserved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Released => "released",
            ReservationStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The state of a refund order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    /// Applied for, awaiting a processor decision.
    #[default]
    Pending,

    /// Approved by a processor.
    Approved,

    /// Rejected by a processor; the order is restored.
    Rejected,

    /// Payout in progress.
    Processing,

    /// Payout settled.
    Completed,

    /// Payout failed.
    Failed,
}

impl RefundStatus {
    /// Returns true while the refund still counts against the
    /// one-open-refund-per-order rule.
    pub fn is_open(&self) -> bool {
        !matches!(self, RefundStatus::Rejected | RefundStatus::Failed)
    }

    /// Returns true if a processor decision is still possible.
    pub fn can_process(&self) -> bool {
        matches!(self, RefundStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Approved => "approved",
            RefundStatus::Rejected => "rejected",
            RefundStatus::Processing => "processing",
            RefundStatus::Completed => "completed",
            RefundStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The state of a timeout compensation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Awaiting delivery by the external scheduler.
    #[default]
    Pending,

    /// Claimed by a dispatcher.
    Processing,

    /// Compensation ran (or was a no-op).
    Completed,

    /// Compensation failed; re-delivery is the scheduler's call.
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a timeout task compensates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutKind {
    /// Cancel the order if still unpaid at expiry.
    OrderUnpaid,

    /// Expire stale stock reservations at expiry.
    StockReservation,
}

impl TimeoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeoutKind::OrderUnpaid => "order_unpaid",
            TimeoutKind::StockReservation => "stock_reservation",
        }
    }
}

impl std::fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
