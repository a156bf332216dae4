//! Store traits and update descriptors.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderNo, RefundNo, ReserveId, TaskId, UserId};
use domain::{
    Money, Order, OrderItem, OrderStatus, RefundOrder, RefundStatus, ReservationStatus,
    StockReservation, TaskStatus, TimeoutKind, TimeoutTask,
};

use crate::error::Result;
use crate::query::{OrderFilter, TimeRange};

/// Field changes applied together with an order status transition.
///
/// Only the fields relevant to the transition are set; everything else on
/// the record is left untouched. The whole update is applied atomically by
/// [`OrderStore::transition`].
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: OrderStatus,
    pub payment_no: Option<String>,
    pub shipping_no: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl OrderUpdate {
    /// Starts an update moving the order to `status`.
    pub fn to(status: OrderStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn payment_no(mut self, payment_no: impl Into<String>) -> Self {
        self.payment_no = Some(payment_no.into());
        self
    }

    pub fn shipping_no(mut self, shipping_no: impl Into<String>) -> Self {
        self.shipping_no = Some(shipping_no.into());
        self
    }

    pub fn paid_at(mut self, at: DateTime<Utc>) -> Self {
        self.paid_at = Some(at);
        self
    }

    pub fn shipped_at(mut self, at: DateTime<Utc>) -> Self {
        self.shipped_at = Some(at);
        self
    }

    pub fn delivered_at(mut self, at: DateTime<Utc>) -> Self {
        self.delivered_at = Some(at);
        self
    }

    pub fn cancelled_at(mut self, at: DateTime<Utc>) -> Self {
        self.cancelled_at = Some(at);
        self
    }
}

/// Store for orders and their owned items.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists an order together with its items as one atomic unit.
    /// Fails with `Duplicate` if the order number is already taken.
    async fn insert(&self, order: Order, items: Vec<OrderItem>) -> Result<()>;

    async fn find(&self, order_no: &OrderNo) -> Result<Option<Order>>;

    async fn items(&self, order_no: &OrderNo) -> Result<Vec<OrderItem>>;

    /// Conditionally moves the order to a new status, applying `update` in
    /// the same atomic step. Succeeds only while the current status is one
    /// of `from`; returns the updated record.
    async fn transition(
        &self,
        order_no: &OrderNo,
        from: &[OrderStatus],
        update: OrderUpdate,
    ) -> Result<Order>;

    /// Lists matching orders (newest first) and the total match count.
    async fn list(&self, filter: &OrderFilter) -> Result<(Vec<Order>, u64)>;

    async fn count(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        range: Option<&TimeRange>,
    ) -> Result<u64>;

    /// Sums `total_amount` over a user's orders in the range.
    async fn sum_total(&self, user_id: UserId, range: Option<&TimeRange>) -> Result<Money>;
}

/// Store for stock reservations.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn insert(&self, reservation: StockReservation) -> Result<()>;

    async fn find(&self, reserve_id: &ReserveId) -> Result<Option<StockReservation>>;

    async fn find_by_order(&self, order_no: &OrderNo) -> Result<Vec<StockReservation>>;

    /// Conditionally moves the reservation from `from` to `to`; the only
    /// legal `from` is `reserved` since every other status is terminal.
    async fn transition(
        &self,
        reserve_id: &ReserveId,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<StockReservation>;
}

/// Field changes applied together with a refund status transition.
#[derive(Debug, Clone)]
pub struct RefundUpdate {
    pub status: RefundStatus,
    pub processor: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    /// Appended to the stored reason, separated by `" | "`.
    pub remark: Option<String>,
}

impl RefundUpdate {
    pub fn to(status: RefundStatus) -> Self {
        Self {
            status,
            processor: None,
            processed_at: None,
            remark: None,
        }
    }

    pub fn processor(mut self, processor: impl Into<String>) -> Self {
        self.processor = Some(processor.into());
        self
    }

    pub fn processed_at(mut self, at: DateTime<Utc>) -> Self {
        self.processed_at = Some(at);
        self
    }

    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }
}

/// Store for refund orders.
#[async_trait]
pub trait RefundStore: Send + Sync {
    async fn insert(&self, refund: RefundOrder) -> Result<()>;

    async fn find(&self, refund_no: &RefundNo) -> Result<Option<RefundOrder>>;

    /// Returns the open (non-rejected, non-failed) refund for an order, if
    /// any. The one-open-refund rule is checked through this lookup, not
    /// enforced by the store.
    async fn find_open_by_order(&self, order_no: &OrderNo) -> Result<Option<RefundOrder>>;

    /// Conditionally moves the refund out of `from`, applying `update`
    /// atomically; returns the updated record.
    async fn transition(
        &self,
        refund_no: &RefundNo,
        from: RefundStatus,
        update: RefundUpdate,
    ) -> Result<RefundOrder>;
}

/// Store for timeout compensation tasks.
#[async_trait]
pub trait TimeoutTaskStore: Send + Sync {
    async fn insert(&self, task: TimeoutTask) -> Result<()>;

    async fn find(&self, task_id: &TaskId) -> Result<Option<TimeoutTask>>;

    /// Conditionally moves the task from `from` to `to`. Dispatchers claim
    /// tasks with `pending → processing`; concurrent deliveries race to one
    /// winner here.
    async fn transition(
        &self,
        task_id: &TaskId,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<TimeoutTask>;

    /// Stamps the task `failed` and increments its retry count in one step.
    /// Unguarded: a failure must be recordable whatever the current status.
    async fn record_failure(&self, task_id: &TaskId) -> Result<TimeoutTask>;

    /// Deletes pending tasks guarding the order, optionally restricted to
    /// one kind; returns how many were removed. Used when the guarded
    /// entity resolves before its deadline.
    async fn delete_pending(&self, order_no: &OrderNo, kind: Option<TimeoutKind>) -> Result<u64>;

    /// Returns up to `limit` pending tasks due at `now`, soonest first.
    /// Exists for the external scheduler; the dispatcher itself never polls.
    async fn find_due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<TimeoutTask>>;
}

/// The five record stores bundled for handing to the engine services.
#[derive(Clone)]
pub struct Stores {
    pub orders: Arc<dyn OrderStore>,
    pub reservations: Arc<dyn ReservationStore>,
    pub refunds: Arc<dyn RefundStore>,
    pub tasks: Arc<dyn TimeoutTaskStore>,
}

impl Stores {
    /// Creates a bundle backed entirely by in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(crate::memory::InMemoryOrderStore::new()),
            reservations: Arc::new(crate::memory::InMemoryReservationStore::new()),
            refunds: Arc::new(crate::memory::InMemoryRefundStore::new()),
            tasks: Arc::new(crate::memory::InMemoryTimeoutTaskStore::new()),
        }
    }
}
