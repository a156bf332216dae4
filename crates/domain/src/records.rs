//! Record types persisted by the stores.
//!
//! The order exclusively owns its items (they are written and deleted with
//! it); reservations, refunds and timeout tasks hold a back-reference to an
//! order by number, for lookup only.

use chrono::{DateTime, Utc};
use common::{OrderNo, ProductId, RefundNo, ReserveId, TaskId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::{OrderStatus, RefundStatus, ReservationStatus, TaskStatus, TimeoutKind};

/// A purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_no: OrderNo,
    pub user_id: UserId,

    /// Sum of item `unit_price × quantity`, fixed at creation time and
    /// never recomputed, even if catalog prices change later.
    pub total_amount: Money,
    pub status: OrderStatus,

    pub address: String,
    pub phone: String,
    pub receiver: Option<String>,

    pub payment_no: Option<String>,
    pub shipping_no: Option<String>,

    pub paid_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns true if the given user placed this order.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// An immutable line-item snapshot captured at order creation.
///
/// Name, price and image are copied from the catalog at creation so that
/// later catalog changes never retroactively alter historical orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_no: OrderNo,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub image: String,
}

impl OrderItem {
    /// Returns `unit_price × quantity`.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A time-bounded hold on inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReservation {
    pub reserve_id: ReserveId,
    pub order_no: OrderNo,
    pub product_id: ProductId,
    pub quantity: u32,
    pub status: ReservationStatus,
    pub expire_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockReservation {
    /// Returns true once the hold has lapsed past its expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expire_time
    }
}

/// A refund application layered on top of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundOrder {
    pub refund_no: RefundNo,
    pub order_no: OrderNo,
    pub user_id: UserId,

    /// Never exceeds the order's total.
    pub amount: Money,
    pub status: RefundStatus,
    pub reason: String,

    pub processor: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A scheduled compensation, created alongside the entity it guards and
/// deleted early when that entity resolves before the deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutTask {
    pub task_id: TaskId,
    pub order_no: OrderNo,
    pub kind: TimeoutKind,
    pub status: TaskStatus,
    pub expire_time: DateTime<Utc>,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeoutTask {
    /// Returns true once the deadline has passed.
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expire_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn order() -> Order {
        let now = Utc::now();
        Order {
            order_no: OrderNo::new("ORD1"),
            user_id: UserId::new(1),
            total_amount: Money::from_cents(2500),
            status: OrderStatus::Pending,
            address: "1 Main St".to_string(),
            phone: "555-0100".to_string(),
            receiver: None,
            payment_no: None,
            shipping_no: None,
            paid_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ownership_check() {
        let order = order();
        assert!(order.is_owned_by(UserId::new(1)));
        assert!(!order.is_owned_by(UserId::new(2)));
    }

    #[test]
    fn test_item_subtotal() {
        let item = OrderItem {
            order_no: OrderNo::new("ORD1"),
            product_id: ProductId::new(7),
            product_name: "Widget".to_string(),
            unit_price: Money::from_cents(1000),
            quantity: 2,
            image: String::new(),
        };
        assert_eq!(item.subtotal().cents(), 2000);
    }

    #[test]
    fn test_reservation_expiry_boundary() {
        let now = Utc::now();
        let reservation = StockReservation {
            reserve_id: ReserveId::new("RES1"),
            order_no: OrderNo::new("ORD1"),
            product_id: ProductId::new(7),
            quantity: 1,
            status: ReservationStatus::Reserved,
            expire_time: now,
            created_at: now,
            updated_at: now,
        };

        assert!(!reservation.is_expired_at(now));
        assert!(reservation.is_expired_at(now + Duration::seconds(1)));
    }

    #[test]
    fn test_task_due_boundary() {
        let now = Utc::now();
        let task = TimeoutTask {
            task_id: TaskId::new("TASK1"),
            order_no: OrderNo::new("ORD1"),
            kind: TimeoutKind::OrderUnpaid,
            status: TaskStatus::Pending,
            expire_time: now,
            retry_count: 0,
            created_at: now,
            updated_at: now,
        };

        assert!(task.is_due_at(now));
        assert!(!task.is_due_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_order_serialization_roundtrip() {
        let order = order();
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
    }
}
