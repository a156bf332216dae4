//! Stock reservation tracker.
//!
//! Reservations are time-bounded holds tracked independently of order
//! status: an order stays valid even when its reservations fail or lapse,
//! and reconciliation happens at fulfillment time. Only a `reserved` hold
//! can move, and it moves exactly once.

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{OrderNo, ProductId, ReserveId};
use domain::{
    OrderError, ReservationStatus, StockReservation, TaskStatus, TimeoutKind, TimeoutTask,
};
use store::{StoreError, Stores};

use crate::clients::ProductCatalog;
use crate::config::EngineConfig;
use crate::{ids, map_transition_err};

/// Creates, releases, confirms and expires per-item stock holds.
#[derive(Clone)]
pub struct ReservationTracker {
    stores: Stores,
    catalog: Arc<dyn ProductCatalog>,
    config: EngineConfig,
}

impl ReservationTracker {
    pub fn new(stores: Stores, catalog: Arc<dyn ProductCatalog>, config: EngineConfig) -> Self {
        Self {
            stores,
            catalog,
            config,
        }
    }

    /// Places a hold on `quantity` units of a product for an order.
    ///
    /// The synchronous stock check is authoritative: a negative answer or
    /// an unreachable catalog fails the reservation with
    /// `InsufficientStock` and nothing is recorded. On success a matching
    /// `stock_reservation` timeout task guards the hold's expiry.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(
        &self,
        order_no: &OrderNo,
        product_id: ProductId,
        quantity: u32,
        ttl_secs: Option<i64>,
    ) -> Result<StockReservation, OrderError> {
        if quantity == 0 {
            return Err(OrderError::validation("reservation quantity must be positive"));
        }
        let ttl = ttl_secs
            .filter(|t| *t > 0)
            .unwrap_or(self.config.reservation_ttl_secs);

        let available = match self.catalog.check_stock(product_id, quantity).await {
            Ok(available) => available,
            Err(err) => {
                tracing::warn!(%product_id, %err, "stock check failed, treating as unavailable");
                false
            }
        };
        if !available {
            return Err(OrderError::InsufficientStock {
                product_id,
                requested: quantity,
            });
        }

        let now = Utc::now();
        let expire_time = now + Duration::seconds(ttl);

        let mut reservation = StockReservation {
            reserve_id: ids::reserve_id(),
            order_no: order_no.clone(),
            product_id,
            quantity,
            status: ReservationStatus::Reserved,
            expire_time,
            created_at: now,
            updated_at: now,
        };

        let mut attempts = 0;
        loop {
            match self.stores.reservations.insert(reservation.clone()).await {
                Ok(()) => break,
                Err(StoreError::Duplicate(_)) if attempts < 2 => {
                    attempts += 1;
                    reservation.reserve_id = ids::reserve_id();
                }
                Err(err) => return Err(OrderError::internal(err)),
            }
        }

        let task = TimeoutTask {
            task_id: ids::task_id(),
            order_no: order_no.clone(),
            kind: TimeoutKind::StockReservation,
            status: TaskStatus::Pending,
            expire_time,
            retry_count: 0,
            created_at: now,
            updated_at: now,
        };
        if let Err(err) = self.stores.tasks.insert(task).await {
            tracing::warn!(%order_no, %err, "failed to schedule reservation timeout task");
        }

        metrics::counter!("stock_reservations_total").increment(1);
        tracing::info!(
            reserve_id = %reservation.reserve_id,
            %order_no,
            %product_id,
            quantity,
            "stock reserved"
        );
        Ok(reservation)
    }

    /// Gives a hold back, e.g. when its order is cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn release(
        &self,
        reserve_id: &ReserveId,
        reason: &str,
    ) -> Result<StockReservation, OrderError> {
        let released = self
            .stores
            .reservations
            .transition(
                reserve_id,
                ReservationStatus::Reserved,
                ReservationStatus::Released,
            )
            .await
            .map_err(|e| {
                map_transition_err(e, "release reservation", "reservation", reserve_id.as_str())
            })?;

        tracing::info!(%reserve_id, reason, "stock reservation released");

        if let Err(err) = self
            .stores
            .tasks
            .delete_pending(&released.order_no, Some(TimeoutKind::StockReservation))
            .await
        {
            tracing::warn!(%reserve_id, %err, "failed to delete reservation timeout task");
        }

        Ok(released)
    }

    /// Converts a hold into a real deduction.
    ///
    /// Expiry always wins a race with confirmation: a hold past its
    /// `expire_time` is expired on the spot and the call fails `Expired`,
    /// even if no dispatcher sweep has seen it yet.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(
        &self,
        order_no: &OrderNo,
        reserve_id: &ReserveId,
    ) -> Result<StockReservation, OrderError> {
        let reservation = self
            .stores
            .reservations
            .find(reserve_id)
            .await
            .map_err(OrderError::internal)?
            .ok_or_else(|| OrderError::not_found("reservation", reserve_id))?;

        if reservation.order_no != *order_no {
            return Err(OrderError::conflict(
                "confirm reservation",
                format!("reserved for order {}", reservation.order_no),
            ));
        }
        if reservation.status.is_terminal() {
            return Err(OrderError::conflict(
                "confirm reservation",
                reservation.status,
            ));
        }

        if reservation.is_expired_at(Utc::now()) {
            let expired = self
                .stores
                .reservations
                .transition(
                    reserve_id,
                    ReservationStatus::Reserved,
                    ReservationStatus::Expired,
                )
                .await
                .map_err(|e| {
                    map_transition_err(e, "expire reservation", "reservation", reserve_id.as_str())
                })?;
            metrics::counter!("stock_reservations_expired_total").increment(1);
            return Err(OrderError::Expired {
                reserve_id: reserve_id.clone(),
                expired_at: expired.expire_time,
            });
        }

        self.stores
            .reservations
            .transition(
                reserve_id,
                ReservationStatus::Reserved,
                ReservationStatus::Confirmed,
            )
            .await
            .map_err(|e| {
                map_transition_err(e, "confirm reservation", "reservation", reserve_id.as_str())
            })
    }
}
