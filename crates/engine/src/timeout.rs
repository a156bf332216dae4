//! Timeout compensation dispatcher.
//!
//! Pure state-driven replay: an external scheduler decides *when* a task
//! is due and hands it in; this component only decides *what happens*. It
//! never waits, and it re-validates current state before acting, because
//! the world may have moved on between the task's creation and its
//! delivery. The conditional `pending → processing` claim makes
//! at-least-once delivery safe: duplicate deliveries lose the
//! compare-and-set.

use chrono::Utc;
use common::{OrderNo, TaskId};
use domain::{OrderError, ReservationStatus, TaskStatus, TimeoutKind, TimeoutTask};
use serde::Serialize;
use store::{StoreError, Stores};

use crate::lifecycle::OrderLifecycle;
use crate::map_transition_err;

/// What a processed task did.
#[derive(Debug, Clone, Serialize)]
pub struct TimeoutReport {
    pub task_id: TaskId,
    pub order_no: OrderNo,
    pub action: &'static str,
    pub result: &'static str,
}

/// Replays the compensating action for a due timeout task.
#[derive(Clone)]
pub struct TimeoutDispatcher {
    stores: Stores,
    lifecycle: OrderLifecycle,
}

impl TimeoutDispatcher {
    pub fn new(stores: Stores, lifecycle: OrderLifecycle) -> Self {
        Self { stores, lifecycle }
    }

    /// Processes one due task.
    ///
    /// On handler success the task moves to `completed`; on handler failure
    /// its retry count is incremented and it is stamped `failed`. Whether
    /// and when to re-deliver is the external scheduler's policy.
    #[tracing::instrument(skip(self))]
    pub async fn process(
        &self,
        task_id: &TaskId,
        kind: TimeoutKind,
    ) -> Result<TimeoutReport, OrderError> {
        let task = self
            .stores
            .tasks
            .find(task_id)
            .await
            .map_err(OrderError::internal)?
            .ok_or_else(|| OrderError::not_found("timeout task", task_id))?;

        if task.kind != kind {
            return Err(OrderError::validation(format!(
                "task {task_id} is of kind {}, not {kind}",
                task.kind
            )));
        }

        // Claim the task; concurrent deliveries race to one winner here.
        self.stores
            .tasks
            .transition(task_id, TaskStatus::Pending, TaskStatus::Processing)
            .await
            .map_err(|e| {
                map_transition_err(e, "process timeout task", "timeout task", task_id.as_str())
            })?;

        let action = match kind {
            TimeoutKind::OrderUnpaid => "cancel_order",
            TimeoutKind::StockReservation => "expire_reservations",
        };

        let outcome = match kind {
            TimeoutKind::OrderUnpaid => self.handle_unpaid_order(&task).await,
            TimeoutKind::StockReservation => self.handle_reservation_expiry(&task).await,
        };

        match outcome {
            Ok(()) => {
                if let Err(err) = self
                    .stores
                    .tasks
                    .transition(task_id, TaskStatus::Processing, TaskStatus::Completed)
                    .await
                {
                    tracing::warn!(%task_id, %err, "failed to mark timeout task completed");
                }
                metrics::counter!("timeout_tasks_processed_total").increment(1);
                Ok(TimeoutReport {
                    task_id: task_id.clone(),
                    order_no: task.order_no,
                    action,
                    result: "success",
                })
            }
            Err(err) => {
                tracing::error!(%task_id, %err, "timeout compensation failed");
                if let Err(stamp_err) = self.stores.tasks.record_failure(task_id).await {
                    tracing::error!(%task_id, %stamp_err, "failed to record task failure");
                }
                metrics::counter!("timeout_tasks_failed_total").increment(1);
                Err(err)
            }
        }
    }

    /// An unpaid-order deadline fired: cancel the order unless payment (or
    /// manual cancellation) already resolved it.
    async fn handle_unpaid_order(&self, task: &TimeoutTask) -> Result<(), OrderError> {
        let order = self
            .stores
            .orders
            .find(&task.order_no)
            .await
            .map_err(OrderError::internal)?
            .ok_or_else(|| OrderError::not_found("order", &task.order_no))?;

        if !order.status.can_pay() {
            tracing::info!(
                order_no = %task.order_no,
                status = %order.status,
                "order already resolved, timeout is a no-op"
            );
            return Ok(());
        }

        match self
            .lifecycle
            .cancel_order(&task.order_no, order.user_id, "payment timeout")
            .await
        {
            Ok(_) => Ok(()),
            // Someone paid or cancelled between the re-read and the
            // compare-and-set; the task's job is done either way.
            Err(OrderError::Conflict { .. }) => {
                tracing::info!(order_no = %task.order_no, "order resolved concurrently");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// A reservation deadline fired: expire every hold on the order that is
    /// still `reserved` and past its own expiry.
    async fn handle_reservation_expiry(&self, task: &TimeoutTask) -> Result<(), OrderError> {
        let reservations = self
            .stores
            .reservations
            .find_by_order(&task.order_no)
            .await
            .map_err(OrderError::internal)?;

        let now = Utc::now();
        for reservation in reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Reserved && r.is_expired_at(now))
        {
            match self
                .stores
                .reservations
                .transition(
                    &reservation.reserve_id,
                    ReservationStatus::Reserved,
                    ReservationStatus::Expired,
                )
                .await
            {
                Ok(_) => {
                    metrics::counter!("stock_reservations_expired_total").increment(1);
                    tracing::info!(
                        reserve_id = %reservation.reserve_id,
                        order_no = %task.order_no,
                        "stock reservation expired"
                    );
                }
                // Lost the race to a release or confirm; nothing to do.
                Err(StoreError::StaleStatus { .. }) => {}
                Err(err) => {
                    tracing::warn!(
                        reserve_id = %reservation.reserve_id,
                        %err,
                        "failed to expire reservation"
                    );
                }
            }
        }

        Ok(())
    }
}
