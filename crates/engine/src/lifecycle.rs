//! Order lifecycle manager.
//!
//! Owns order state transitions, totals and identifier generation. Every
//! status change is a conditional store transition, so two competing
//! writers race to exactly one winner; the loser gets `Conflict` and the
//! record is untouched.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{OrderNo, ProductId, UserId};
use domain::{
    Money, Order, OrderError, OrderItem, OrderStatus, ReservationStatus, TaskStatus, TimeoutKind,
    TimeoutTask,
};
use serde::{Deserialize, Serialize};
use store::{OrderFilter, OrderUpdate, StoreError, Stores, TimeRange};

use crate::background::TaskSpawner;
use crate::clients::{ProductCatalog, UserDirectory};
use crate::config::EngineConfig;
use crate::reservation::ReservationTracker;
use crate::{ids, map_transition_err};

/// Image recorded on an item when the catalog cannot supply one.
const DEFAULT_PRODUCT_IMAGE: &str = "https://static.example.com/products/default.png";

/// A request to create an order.
///
/// Items carry caller-supplied name and price so the order can still be
/// taken when the catalog is unreachable (degraded mode); when the catalog
/// answers, its data is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<NewOrderItem>,
    pub address: String,
    pub phone: String,
    pub receiver: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

/// What the caller gets back from order creation.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub order_no: OrderNo,
    pub total_amount: Money,
    pub payment_url: String,
}

/// An order together with its item snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Per-user order statistics.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStats {
    pub total_orders: u64,
    pub total_amount: Money,
    pub status_counts: HashMap<String, u64>,
}

/// Item data resolved against the catalog, pending an order number.
struct ItemSnapshot {
    product_id: ProductId,
    product_name: String,
    unit_price: Money,
    quantity: u32,
    image: String,
}

/// Service owning order state transitions.
#[derive(Clone)]
pub struct OrderLifecycle {
    stores: Stores,
    tracker: ReservationTracker,
    catalog: Arc<dyn ProductCatalog>,
    users: Arc<dyn UserDirectory>,
    spawner: Arc<dyn TaskSpawner>,
    config: EngineConfig,
}

impl OrderLifecycle {
    pub fn new(
        stores: Stores,
        tracker: ReservationTracker,
        catalog: Arc<dyn ProductCatalog>,
        users: Arc<dyn UserDirectory>,
        spawner: Arc<dyn TaskSpawner>,
        config: EngineConfig,
    ) -> Self {
        Self {
            stores,
            tracker,
            catalog,
            users,
            spawner,
            config,
        }
    }

    /// Creates an order: validates, snapshots item data, persists the order
    /// with its items atomically, then submits the fire-and-forget side
    /// effects (per-item stock reservation, unpaid-order timeout task).
    ///
    /// Side-effect failures are logged, never surfaced: the order is valid
    /// even if no stock gets reserved, and fulfillment re-checks stock later.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_order(&self, request: NewOrder) -> Result<OrderReceipt, OrderError> {
        let started = std::time::Instant::now();

        if request.items.is_empty() {
            return Err(OrderError::validation("order items must not be empty"));
        }
        if request.address.trim().is_empty() {
            return Err(OrderError::validation("delivery address must not be empty"));
        }
        if request.phone.trim().is_empty() {
            return Err(OrderError::validation("contact phone must not be empty"));
        }

        // Identity lookup is advisory here: an unreachable directory must
        // not lose the sale.
        if let Err(err) = self.users.user_info(request.user_id).await {
            tracing::warn!(user_id = %request.user_id, %err, "user directory lookup failed, continuing");
        }

        let mut snapshots = Vec::with_capacity(request.items.len());
        for item in &request.items {
            if item.quantity == 0 {
                return Err(OrderError::validation(format!(
                    "quantity for product {} must be positive",
                    item.product_id
                )));
            }
            let snapshot = match self.catalog.product_info(item.product_id).await {
                Ok(info) => ItemSnapshot {
                    product_id: item.product_id,
                    product_name: info.name,
                    unit_price: info.price,
                    quantity: item.quantity,
                    image: info.image,
                },
                Err(err) => {
                    tracing::warn!(
                        product_id = %item.product_id,
                        %err,
                        "catalog unreachable, falling back to caller-supplied item data"
                    );
                    ItemSnapshot {
                        product_id: item.product_id,
                        product_name: item.product_name.clone(),
                        unit_price: item.unit_price,
                        quantity: item.quantity,
                        image: DEFAULT_PRODUCT_IMAGE.to_string(),
                    }
                }
            };
            snapshots.push(snapshot);
        }

        let total_amount: Money = snapshots
            .iter()
            .map(|s| s.unit_price.multiply(s.quantity))
            .sum();

        let now = Utc::now();
        let mut order_no = ids::order_no();
        let mut attempts = 0;
        let order = loop {
            let order = Order {
                order_no: order_no.clone(),
                user_id: request.user_id,
                total_amount,
                status: OrderStatus::Pending,
                address: request.address.clone(),
                phone: request.phone.clone(),
                receiver: request.receiver.clone(),
                payment_no: None,
                shipping_no: None,
                paid_at: None,
                shipped_at: None,
                delivered_at: None,
                cancelled_at: None,
                created_at: now,
                updated_at: now,
            };
            let items: Vec<OrderItem> = snapshots
                .iter()
                .map(|s| OrderItem {
                    order_no: order_no.clone(),
                    product_id: s.product_id,
                    product_name: s.product_name.clone(),
                    unit_price: s.unit_price,
                    quantity: s.quantity,
                    image: s.image.clone(),
                })
                .collect();

            match self.stores.orders.insert(order.clone(), items).await {
                Ok(()) => break order,
                Err(StoreError::Duplicate(_)) if attempts < 2 => {
                    attempts += 1;
                    order_no = ids::order_no();
                }
                Err(err) => return Err(OrderError::internal(err)),
            }
        };

        self.spawn_stock_reservations(&order, &snapshots);
        self.spawn_unpaid_timeout(&order);

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(order_no = %order.order_no, total = %total_amount, "order created");

        Ok(OrderReceipt {
            payment_url: ids::payment_url(&self.config.payment_base_url, &order.order_no),
            order_no: order.order_no,
            total_amount,
        })
    }

    /// Marks an order paid. Deletes the unpaid-order timeout task
    /// best-effort in the background so it cannot fire spuriously.
    #[tracing::instrument(skip(self))]
    pub async fn pay_order(
        &self,
        order_no: &OrderNo,
        user_id: UserId,
        payment_no: Option<String>,
    ) -> Result<Order, OrderError> {
        self.find_owned(order_no, user_id).await?;

        let payment_no = payment_no
            .filter(|p| !p.is_empty())
            .unwrap_or_else(ids::payment_no);

        let paid = self
            .stores
            .orders
            .transition(
                order_no,
                &[OrderStatus::Pending],
                OrderUpdate::to(OrderStatus::Paid)
                    .payment_no(payment_no)
                    .paid_at(Utc::now()),
            )
            .await
            .map_err(|e| map_transition_err(e, "pay order", "order", order_no.as_str()))?;

        let tasks = self.stores.tasks.clone();
        let cleanup_no = order_no.clone();
        self.spawner.spawn(
            "delete_unpaid_timeout",
            Box::pin(async move {
                if let Err(err) = tasks
                    .delete_pending(&cleanup_no, Some(TimeoutKind::OrderUnpaid))
                    .await
                {
                    tracing::warn!(order_no = %cleanup_no, %err, "failed to delete unpaid timeout task");
                }
            }),
        );

        metrics::counter!("orders_paid_total").increment(1);
        tracing::info!(%order_no, "order paid");
        Ok(paid)
    }

    /// Cancels an order and runs the compensating actions: every
    /// still-reserved stock hold is released and pending timeout tasks are
    /// removed. The conditional transition makes this idempotent: a second
    /// cancel loses the compare-and-set and returns `Conflict` without
    /// touching stock again.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_no: &OrderNo,
        user_id: UserId,
        reason: &str,
    ) -> Result<Order, OrderError> {
        self.find_owned(order_no, user_id).await?;

        let cancelled = self
            .stores
            .orders
            .transition(
                order_no,
                &[OrderStatus::Pending, OrderStatus::Paid],
                OrderUpdate::to(OrderStatus::Cancelled).cancelled_at(Utc::now()),
            )
            .await
            .map_err(|e| map_transition_err(e, "cancel order", "order", order_no.as_str()))?;

        tracing::info!(%order_no, reason, "order cancelled");

        // Compensation: give back every hold still standing. Individual
        // failures are logged and skipped; a hold that slips through is
        // caught by its own expiry task.
        match self.stores.reservations.find_by_order(order_no).await {
            Ok(reservations) => {
                for reservation in reservations
                    .iter()
                    .filter(|r| r.status == ReservationStatus::Reserved)
                {
                    if let Err(err) = self
                        .tracker
                        .release(
                            &reservation.reserve_id,
                            &format!("order cancelled: {reason}"),
                        )
                        .await
                    {
                        tracing::warn!(
                            %order_no,
                            reserve_id = %reservation.reserve_id,
                            %err,
                            "failed to release reservation during cancellation"
                        );
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%order_no, %err, "failed to load reservations during cancellation");
            }
        }

        let tasks = self.stores.tasks.clone();
        let cleanup_no = order_no.clone();
        self.spawner.spawn(
            "delete_order_timeouts",
            Box::pin(async move {
                if let Err(err) = tasks.delete_pending(&cleanup_no, None).await {
                    tracing::warn!(order_no = %cleanup_no, %err, "failed to delete timeout tasks");
                }
            }),
        );

        metrics::counter!("orders_cancelled_total").increment(1);
        Ok(cancelled)
    }

    /// Records shipment. Merchant-side operation, no ownership check.
    #[tracing::instrument(skip(self))]
    pub async fn ship_order(
        &self,
        order_no: &OrderNo,
        shipping_no: &str,
    ) -> Result<Order, OrderError> {
        if shipping_no.trim().is_empty() {
            return Err(OrderError::validation("shipping number must not be empty"));
        }

        self.stores
            .orders
            .transition(
                order_no,
                &[OrderStatus::Paid],
                OrderUpdate::to(OrderStatus::Shipped)
                    .shipping_no(shipping_no)
                    .shipped_at(Utc::now()),
            )
            .await
            .map_err(|e| map_transition_err(e, "ship order", "order", order_no.as_str()))
    }

    /// Confirms receipt, completing the order.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_receipt(
        &self,
        order_no: &OrderNo,
        user_id: UserId,
    ) -> Result<Order, OrderError> {
        self.find_owned(order_no, user_id).await?;

        self.stores
            .orders
            .transition(
                order_no,
                &[OrderStatus::Shipped],
                OrderUpdate::to(OrderStatus::Completed).delivered_at(Utc::now()),
            )
            .await
            .map_err(|e| map_transition_err(e, "confirm receipt", "order", order_no.as_str()))
    }

    /// Loads an order with its items. A supplied `user_id` must match the
    /// owner.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_no: &OrderNo,
        user_id: Option<UserId>,
    ) -> Result<OrderDetail, OrderError> {
        let order = self.find_order(order_no).await?;
        if let Some(user_id) = user_id
            && !order.is_owned_by(user_id)
        {
            return Err(OrderError::forbidden("order", order_no, user_id));
        }

        let items = self
            .stores
            .orders
            .items(order_no)
            .await
            .map_err(OrderError::internal)?;

        Ok(OrderDetail { order, items })
    }

    /// Lists a user's orders (newest first) with their items and the total
    /// match count.
    #[tracing::instrument(skip(self, filter), fields(user_id = %filter.user_id))]
    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
    ) -> Result<(Vec<OrderDetail>, u64), OrderError> {
        let (orders, total) = self
            .stores
            .orders
            .list(filter)
            .await
            .map_err(OrderError::internal)?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self
                .stores
                .orders
                .items(&order.order_no)
                .await
                .map_err(OrderError::internal)?;
            details.push(OrderDetail { order, items });
        }

        Ok((details, total))
    }

    /// Aggregates a user's order count, spend and per-status counts over an
    /// optional creation-time range.
    #[tracing::instrument(skip(self))]
    pub async fn order_stats(
        &self,
        user_id: UserId,
        range: Option<TimeRange>,
    ) -> Result<OrderStats, OrderError> {
        let range = range.as_ref();

        let total_orders = self
            .stores
            .orders
            .count(user_id, None, range)
            .await
            .map_err(OrderError::internal)?;
        let total_amount = self
            .stores
            .orders
            .sum_total(user_id, range)
            .await
            .map_err(OrderError::internal)?;

        let mut status_counts = HashMap::new();
        for status in OrderStatus::all() {
            let count = self
                .stores
                .orders
                .count(user_id, Some(status), range)
                .await
                .map_err(OrderError::internal)?;
            status_counts.insert(status.as_str().to_string(), count);
        }

        Ok(OrderStats {
            total_orders,
            total_amount,
            status_counts,
        })
    }

    async fn find_order(&self, order_no: &OrderNo) -> Result<Order, OrderError> {
        self.stores
            .orders
            .find(order_no)
            .await
            .map_err(OrderError::internal)?
            .ok_or_else(|| OrderError::not_found("order", order_no))
    }

    async fn find_owned(&self, order_no: &OrderNo, user_id: UserId) -> Result<Order, OrderError> {
        let order = self.find_order(order_no).await?;
        if !order.is_owned_by(user_id) {
            return Err(OrderError::forbidden("order", order_no, user_id));
        }
        Ok(order)
    }

    fn spawn_stock_reservations(&self, order: &Order, snapshots: &[ItemSnapshot]) {
        let tracker = self.tracker.clone();
        let order_no = order.order_no.clone();
        let items: Vec<(ProductId, u32)> =
            snapshots.iter().map(|s| (s.product_id, s.quantity)).collect();
        let ttl = self.config.reservation_ttl_secs;

        self.spawner.spawn(
            "reserve_order_stock",
            Box::pin(async move {
                for (product_id, quantity) in items {
                    if let Err(err) = tracker
                        .reserve(&order_no, product_id, quantity, Some(ttl))
                        .await
                    {
                        tracing::warn!(
                            %order_no,
                            %product_id,
                            %err,
                            "stock reservation failed, order remains valid"
                        );
                    }
                }
            }),
        );
    }

    fn spawn_unpaid_timeout(&self, order: &Order) {
        let tasks = self.stores.tasks.clone();
        let now = Utc::now();
        let task = TimeoutTask {
            task_id: ids::task_id(),
            order_no: order.order_no.clone(),
            kind: TimeoutKind::OrderUnpaid,
            status: TaskStatus::Pending,
            expire_time: now + Duration::seconds(self.config.unpaid_order_ttl_secs),
            retry_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.spawner.spawn(
            "schedule_unpaid_timeout",
            Box::pin(async move {
                let order_no = task.order_no.clone();
                if let Err(err) = tasks.insert(task).await {
                    tracing::warn!(%order_no, %err, "failed to schedule unpaid-order timeout task");
                }
            }),
        );
    }
}
