//! In-memory store implementations.
//!
//! These back the engine in tests and single-process deployments and define
//! the reference semantics a SQL adapter must match: every `transition` is
//! atomic per record and checks the expected status under the same lock
//! that applies the update.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderNo, RefundNo, ReserveId, TaskId, UserId};
use domain::{
    Money, Order, OrderItem, OrderStatus, RefundOrder, RefundStatus, ReservationStatus,
    StockReservation, TaskStatus, TimeoutKind, TimeoutTask,
};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::query::{OrderFilter, TimeRange};
use crate::store::{
    OrderStore, OrderUpdate, RefundStore, RefundUpdate, ReservationStore, TimeoutTaskStore,
};

fn expected_list(from: &[&str]) -> String {
    from.join(", ")
}

#[derive(Default)]
struct OrderInner {
    orders: HashMap<OrderNo, Order>,
    items: HashMap<OrderNo, Vec<OrderItem>>,
}

/// In-memory order store; orders and their items live under one lock so the
/// combined insert is atomic.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<OrderInner>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn len(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.orders.is_empty()
    }
}

fn matches_filter(
    order: &Order,
    user_id: UserId,
    status: Option<OrderStatus>,
    range: Option<&TimeRange>,
) -> bool {
    if order.user_id != user_id {
        return false;
    }
    if let Some(status) = status
        && order.status != status
    {
        return false;
    }
    if let Some(range) = range
        && !range.contains(order.created_at)
    {
        return false;
    }
    true
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order, items: Vec<OrderItem>) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.orders.contains_key(&order.order_no) {
            return Err(StoreError::Duplicate(order.order_no.to_string()));
        }
        inner.items.insert(order.order_no.clone(), items);
        inner.orders.insert(order.order_no.clone(), order);
        Ok(())
    }

    async fn find(&self, order_no: &OrderNo) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(order_no).cloned())
    }

    async fn items(&self, order_no: &OrderNo) -> Result<Vec<OrderItem>> {
        Ok(self
            .inner
            .read()
            .await
            .items
            .get(order_no)
            .cloned()
            .unwrap_or_default())
    }

    async fn transition(
        &self,
        order_no: &OrderNo,
        from: &[OrderStatus],
        update: OrderUpdate,
    ) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(order_no)
            .ok_or_else(|| StoreError::NotFound(order_no.to_string()))?;

        if !from.contains(&order.status) {
            return Err(StoreError::StaleStatus {
                key: order_no.to_string(),
                expected: expected_list(&from.iter().map(|s| s.as_str()).collect::<Vec<_>>()),
                actual: order.status.as_str().to_string(),
            });
        }

        order.status = update.status;
        if let Some(payment_no) = update.payment_no {
            order.payment_no = Some(payment_no);
        }
        if let Some(shipping_no) = update.shipping_no {
            order.shipping_no = Some(shipping_no);
        }
        if let Some(at) = update.paid_at {
            order.paid_at = Some(at);
        }
        if let Some(at) = update.shipped_at {
            order.shipped_at = Some(at);
        }
        if let Some(at) = update.delivered_at {
            order.delivered_at = Some(at);
        }
        if let Some(at) = update.cancelled_at {
            order.cancelled_at = Some(at);
        }
        order.updated_at = Utc::now();

        Ok(order.clone())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<(Vec<Order>, u64)> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| matches_filter(o, filter.user_id, filter.status, filter.range.as_ref()))
            .cloned()
            .collect();

        // Newest first; order number breaks creation-time ties.
        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_no.as_str().cmp(a.order_no.as_str()))
        });

        let total = matches.len() as u64;
        let page: Vec<Order> = matches
            .into_iter()
            .skip(filter.offset())
            .take(filter.limit())
            .collect();

        Ok((page, total))
    }

    async fn count(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        range: Option<&TimeRange>,
    ) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .filter(|o| matches_filter(o, user_id, status, range))
            .count() as u64)
    }

    async fn sum_total(&self, user_id: UserId, range: Option<&TimeRange>) -> Result<Money> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .filter(|o| matches_filter(o, user_id, None, range))
            .map(|o| o.total_amount)
            .sum())
    }
}

/// In-memory stock reservation store.
#[derive(Clone, Default)]
pub struct InMemoryReservationStore {
    inner: Arc<RwLock<HashMap<ReserveId, StockReservation>>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn insert(&self, reservation: StockReservation) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.contains_key(&reservation.reserve_id) {
            return Err(StoreError::Duplicate(reservation.reserve_id.to_string()));
        }
        inner.insert(reservation.reserve_id.clone(), reservation);
        Ok(())
    }

    async fn find(&self, reserve_id: &ReserveId) -> Result<Option<StockReservation>> {
        Ok(self.inner.read().await.get(reserve_id).cloned())
    }

    async fn find_by_order(&self, order_no: &OrderNo) -> Result<Vec<StockReservation>> {
        let inner = self.inner.read().await;
        let mut reservations: Vec<StockReservation> = inner
            .values()
            .filter(|r| &r.order_no == order_no)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(reservations)
    }

    async fn transition(
        &self,
        reserve_id: &ReserveId,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<StockReservation> {
        let mut inner = self.inner.write().await;
        let reservation = inner
            .get_mut(reserve_id)
            .ok_or_else(|| StoreError::NotFound(reserve_id.to_string()))?;

        if reservation.status != from {
            return Err(StoreError::StaleStatus {
                key: reserve_id.to_string(),
                expected: from.as_str().to_string(),
                actual: reservation.status.as_str().to_string(),
            });
        }

        reservation.status = to;
        reservation.updated_at = Utc::now();
        Ok(reservation.clone())
    }
}

/// In-memory refund store.
#[derive(Clone, Default)]
pub struct InMemoryRefundStore {
    inner: Arc<RwLock<HashMap<RefundNo, RefundOrder>>>,
}

impl InMemoryRefundStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefundStore for InMemoryRefundStore {
    async fn insert(&self, refund: RefundOrder) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.contains_key(&refund.refund_no) {
            return Err(StoreError::Duplicate(refund.refund_no.to_string()));
        }
        inner.insert(refund.refund_no.clone(), refund);
        Ok(())
    }

    async fn find(&self, refund_no: &RefundNo) -> Result<Option<RefundOrder>> {
        Ok(self.inner.read().await.get(refund_no).cloned())
    }

    async fn find_open_by_order(&self, order_no: &OrderNo) -> Result<Option<RefundOrder>> {
        let inner = self.inner.read().await;
        Ok(inner
            .values()
            .find(|r| &r.order_no == order_no && r.status.is_open())
            .cloned())
    }

    async fn transition(
        &self,
        refund_no: &RefundNo,
        from: RefundStatus,
        update: RefundUpdate,
    ) -> Result<RefundOrder> {
        let mut inner = self.inner.write().await;
        let refund = inner
            .get_mut(refund_no)
            .ok_or_else(|| StoreError::NotFound(refund_no.to_string()))?;

        if refund.status != from {
            return Err(StoreError::StaleStatus {
                key: refund_no.to_string(),
                expected: from.as_str().to_string(),
                actual: refund.status.as_str().to_string(),
            });
        }

        refund.status = update.status;
        if let Some(processor) = update.processor {
            refund.processor = Some(processor);
        }
        if let Some(at) = update.processed_at {
            refund.processed_at = Some(at);
        }
        if let Some(remark) = update.remark {
            refund.reason = format!("{} | {}", refund.reason, remark);
        }
        refund.updated_at = Utc::now();

        Ok(refund.clone())
    }
}

/// In-memory timeout task store.
#[derive(Clone, Default)]
pub struct InMemoryTimeoutTaskStore {
    inner: Arc<RwLock<HashMap<TaskId, TimeoutTask>>>,
}

impl InMemoryTimeoutTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tasks, any status.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[async_trait]
impl TimeoutTaskStore for InMemoryTimeoutTaskStore {
    async fn insert(&self, task: TimeoutTask) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.contains_key(&task.task_id) {
            return Err(StoreError::Duplicate(task.task_id.to_string()));
        }
        inner.insert(task.task_id.clone(), task);
        Ok(())
    }

    async fn find(&self, task_id: &TaskId) -> Result<Option<TimeoutTask>> {
        Ok(self.inner.read().await.get(task_id).cloned())
    }

    async fn transition(
        &self,
        task_id: &TaskId,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<TimeoutTask> {
        let mut inner = self.inner.write().await;
        let task = inner
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;

        if task.status != from {
            return Err(StoreError::StaleStatus {
                key: task_id.to_string(),
                expected: from.as_str().to_string(),
                actual: task.status.as_str().to_string(),
            });
        }

        task.status = to;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn record_failure(&self, task_id: &TaskId) -> Result<TimeoutTask> {
        let mut inner = self.inner.write().await;
        let task = inner
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;

        task.status = TaskStatus::Failed;
        task.retry_count += 1;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete_pending(&self, order_no: &OrderNo, kind: Option<TimeoutKind>) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.len();
        inner.retain(|_, task| {
            let guards_order = &task.order_no == order_no
                && task.status == TaskStatus::Pending
                && kind.is_none_or(|k| task.kind == k);
            !guards_order
        });
        Ok((before - inner.len()) as u64)
    }

    async fn find_due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<TimeoutTask>> {
        let inner = self.inner.read().await;
        let mut due: Vec<TimeoutTask> = inner
            .values()
            .filter(|t| t.status == TaskStatus::Pending && t.is_due_at(now))
            .cloned()
            .collect();
        due.sort_by(|a, b| a.expire_time.cmp(&b.expire_time));
        due.truncate(limit);
        Ok(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::ProductId;

    fn order(no: &str, user: i64, status: OrderStatus, cents: i64) -> Order {
        let now = Utc::now();
        Order {
            order_no: OrderNo::new(no),
            user_id: UserId::new(user),
            total_amount: Money::from_cents(cents),
            status,
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

    fn reservation(id: &str, order_no: &str, status: ReservationStatus) -> StockReservation {
        let now = Utc::now();
        StockReservation {
            reserve_id: ReserveId::new(id),
            order_no: OrderNo::new(order_no),
            product_id: ProductId::new(1),
            quantity: 1,
            status,
            expire_time: now + Duration::seconds(900),
            created_at: now,
            updated_at: now,
        }
    }

    fn refund(no: &str, order_no: &str, status: RefundStatus) -> RefundOrder {
        let now = Utc::now();
        RefundOrder {
            refund_no: RefundNo::new(no),
            order_no: OrderNo::new(order_no),
            user_id: UserId::new(1),
            amount: Money::from_cents(1000),
            status,
            reason: "damaged".to_string(),
            processor: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn task(id: &str, order_no: &str, kind: TimeoutKind, expire_in: i64) -> TimeoutTask {
        let now = Utc::now();
        TimeoutTask {
            task_id: TaskId::new(id),
            order_no: OrderNo::new(order_no),
            kind,
            status: TaskStatus::Pending,
            expire_time: now + Duration::seconds(expire_in),
            retry_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_order_no() {
        let store = InMemoryOrderStore::new();
        store
            .insert(order("ORD1", 1, OrderStatus::Pending, 100), vec![])
            .await
            .unwrap();

        let result = store
            .insert(order("ORD1", 2, OrderStatus::Pending, 200), vec![])
            .await;
        assert!(matches!(result, Err(StoreError::Duplicate(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_transition_applies_update_atomically() {
        let store = InMemoryOrderStore::new();
        store
            .insert(order("ORD1", 1, OrderStatus::Pending, 100), vec![])
            .await
            .unwrap();

        let paid_at = Utc::now();
        let updated = store
            .transition(
                &OrderNo::new("ORD1"),
                &[OrderStatus::Pending],
                OrderUpdate::to(OrderStatus::Paid)
                    .payment_no("PAY1")
                    .paid_at(paid_at),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Paid);
        assert_eq!(updated.payment_no.as_deref(), Some("PAY1"));
        assert_eq!(updated.paid_at, Some(paid_at));
    }

    #[tokio::test]
    async fn test_transition_loses_when_status_moved() {
        let store = InMemoryOrderStore::new();
        store
            .insert(order("ORD1", 1, OrderStatus::Cancelled, 100), vec![])
            .await
            .unwrap();

        let result = store
            .transition(
                &OrderNo::new("ORD1"),
                &[OrderStatus::Pending, OrderStatus::Paid],
                OrderUpdate::to(OrderStatus::Cancelled),
            )
            .await;

        match result {
            Err(StoreError::StaleStatus { actual, .. }) => assert_eq!(actual, "cancelled"),
            other => panic!("expected StaleStatus, got {other:?}"),
        }

        // Losing the compare-and-set leaves the record untouched.
        let stored = store.find(&OrderNo::new("ORD1")).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);
        assert!(stored.cancelled_at.is_none());
    }

    #[tokio::test]
    async fn test_transition_missing_order_is_not_found() {
        let store = InMemoryOrderStore::new();
        let result = store
            .transition(
                &OrderNo::new("ORD404"),
                &[OrderStatus::Pending],
                OrderUpdate::to(OrderStatus::Paid),
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let store = InMemoryOrderStore::new();
        for i in 0..15 {
            let status = if i % 2 == 0 {
                OrderStatus::Pending
            } else {
                OrderStatus::Paid
            };
            store
                .insert(order(&format!("ORD{i:02}"), 1, status, 100), vec![])
                .await
                .unwrap();
        }
        store
            .insert(order("OTHER", 2, OrderStatus::Pending, 100), vec![])
            .await
            .unwrap();

        let filter = OrderFilter::for_user(UserId::new(1));
        let (page, total) = store.list(&filter).await.unwrap();
        assert_eq!(total, 15);
        assert_eq!(page.len(), 10);

        let (page2, _) = store.list(&filter.clone().with_page(2, 10)).await.unwrap();
        assert_eq!(page2.len(), 5);

        let (paid, paid_total) = store
            .list(&OrderFilter::for_user(UserId::new(1)).with_status(OrderStatus::Paid))
            .await
            .unwrap();
        assert_eq!(paid_total, 7);
        assert!(paid.iter().all(|o| o.status == OrderStatus::Paid));
    }

    #[tokio::test]
    async fn test_count_and_sum_respect_range() {
        let store = InMemoryOrderStore::new();
        store
            .insert(order("ORD1", 1, OrderStatus::Paid, 1000), vec![])
            .await
            .unwrap();
        store
            .insert(order("ORD2", 1, OrderStatus::Pending, 500), vec![])
            .await
            .unwrap();

        let user = UserId::new(1);
        assert_eq!(store.count(user, None, None).await.unwrap(), 2);
        assert_eq!(
            store
                .count(user, Some(OrderStatus::Paid), None)
                .await
                .unwrap(),
            1
        );
        assert_eq!(store.sum_total(user, None).await.unwrap().cents(), 1500);

        let future = TimeRange::since(Utc::now() + Duration::hours(1));
        assert_eq!(store.count(user, None, Some(&future)).await.unwrap(), 0);
        assert!(store.sum_total(user, Some(&future)).await.unwrap().is_zero());
    }

    #[tokio::test]
    async fn test_reservation_terminal_states_are_immutable() {
        let store = InMemoryReservationStore::new();
        store
            .insert(reservation("RES1", "ORD1", ReservationStatus::Released))
            .await
            .unwrap();

        for to in [
            ReservationStatus::Confirmed,
            ReservationStatus::Expired,
            ReservationStatus::Reserved,
        ] {
            let result = store
                .transition(&ReserveId::new("RES1"), ReservationStatus::Reserved, to)
                .await;
            assert!(matches!(result, Err(StoreError::StaleStatus { .. })));
        }
    }

    #[tokio::test]
    async fn test_find_by_order_returns_all_reservations() {
        let store = InMemoryReservationStore::new();
        store
            .insert(reservation("RES1", "ORD1", ReservationStatus::Reserved))
            .await
            .unwrap();
        store
            .insert(reservation("RES2", "ORD1", ReservationStatus::Released))
            .await
            .unwrap();
        store
            .insert(reservation("RES3", "ORD2", ReservationStatus::Reserved))
            .await
            .unwrap();

        let found = store.find_by_order(&OrderNo::new("ORD1")).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_open_refund_lookup_skips_closed_ones() {
        let store = InMemoryRefundStore::new();
        store
            .insert(refund("REF1", "ORD1", RefundStatus::Rejected))
            .await
            .unwrap();
        store
            .insert(refund("REF2", "ORD1", RefundStatus::Failed))
            .await
            .unwrap();

        assert!(
            store
                .find_open_by_order(&OrderNo::new("ORD1"))
                .await
                .unwrap()
                .is_none()
        );

        store
            .insert(refund("REF3", "ORD1", RefundStatus::Pending))
            .await
            .unwrap();
        let open = store
            .find_open_by_order(&OrderNo::new("ORD1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(open.refund_no.as_str(), "REF3");
    }

    #[tokio::test]
    async fn test_refund_transition_appends_remark() {
        let store = InMemoryRefundStore::new();
        store
            .insert(refund("REF1", "ORD1", RefundStatus::Pending))
            .await
            .unwrap();

        let updated = store
            .transition(
                &RefundNo::new("REF1"),
                RefundStatus::Pending,
                RefundUpdate::to(RefundStatus::Rejected)
                    .processor("admin-7")
                    .processed_at(Utc::now())
                    .remark("out of window"),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, RefundStatus::Rejected);
        assert_eq!(updated.processor.as_deref(), Some("admin-7"));
        assert_eq!(updated.reason, "damaged | out of window");
    }

    #[tokio::test]
    async fn test_task_claim_races_to_one_winner() {
        let store = InMemoryTimeoutTaskStore::new();
        store
            .insert(task("TASK1", "ORD1", TimeoutKind::OrderUnpaid, -10))
            .await
            .unwrap();

        let first = store
            .transition(
                &TaskId::new("TASK1"),
                TaskStatus::Pending,
                TaskStatus::Processing,
            )
            .await;
        assert!(first.is_ok());

        let second = store
            .transition(
                &TaskId::new("TASK1"),
                TaskStatus::Pending,
                TaskStatus::Processing,
            )
            .await;
        assert!(matches!(second, Err(StoreError::StaleStatus { .. })));
    }

    #[tokio::test]
    async fn test_record_failure_increments_retry() {
        let store = InMemoryTimeoutTaskStore::new();
        store
            .insert(task("TASK1", "ORD1", TimeoutKind::OrderUnpaid, -10))
            .await
            .unwrap();

        let failed = store.record_failure(&TaskId::new("TASK1")).await.unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.retry_count, 1);

        let failed = store.record_failure(&TaskId::new("TASK1")).await.unwrap();
        assert_eq!(failed.retry_count, 2);
    }

    #[tokio::test]
    async fn test_delete_pending_respects_kind_filter() {
        let store = InMemoryTimeoutTaskStore::new();
        store
            .insert(task("TASK1", "ORD1", TimeoutKind::OrderUnpaid, 60))
            .await
            .unwrap();
        store
            .insert(task("TASK2", "ORD1", TimeoutKind::StockReservation, 60))
            .await
            .unwrap();
        store
            .insert(task("TASK3", "ORD2", TimeoutKind::OrderUnpaid, 60))
            .await
            .unwrap();

        let removed = store
            .delete_pending(&OrderNo::new("ORD1"), Some(TimeoutKind::OrderUnpaid))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.find(&TaskId::new("TASK1")).await.unwrap().is_none());
        assert!(store.find(&TaskId::new("TASK2")).await.unwrap().is_some());

        let removed = store.delete_pending(&OrderNo::new("ORD1"), None).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_pending_leaves_claimed_tasks() {
        let store = InMemoryTimeoutTaskStore::new();
        store
            .insert(task("TASK1", "ORD1", TimeoutKind::OrderUnpaid, 60))
            .await
            .unwrap();
        store
            .transition(
                &TaskId::new("TASK1"),
                TaskStatus::Pending,
                TaskStatus::Processing,
            )
            .await
            .unwrap();

        let removed = store.delete_pending(&OrderNo::new("ORD1"), None).await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_find_due_orders_by_deadline() {
        let store = InMemoryTimeoutTaskStore::new();
        store
            .insert(task("TASK1", "ORD1", TimeoutKind::OrderUnpaid, -5))
            .await
            .unwrap();
        store
            .insert(task("TASK2", "ORD2", TimeoutKind::OrderUnpaid, -60))
            .await
            .unwrap();
        store
            .insert(task("TASK3", "ORD3", TimeoutKind::OrderUnpaid, 3600))
            .await
            .unwrap();

        let due = store.find_due(Utc::now(), 10).await.unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].task_id.as_str(), "TASK2");

        let due = store.find_due(Utc::now(), 1).await.unwrap();
        assert_eq!(due.len(), 1);
    }
}
