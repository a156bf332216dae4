//! Refund workflow.
//!
//! Apply/approve/reject flow layered on top of paid orders. Applying marks
//! the order `refunded` immediately; callers must read that status as
//! "refund in flight" until a processor decides. A rejection restores the
//! order to `completed`.

use chrono::Utc;
use common::{OrderNo, RefundNo, UserId};
use domain::{Money, OrderError, OrderStatus, RefundOrder, RefundStatus};
use serde::{Deserialize, Serialize};
use store::{OrderUpdate, RefundUpdate, StoreError, Stores};

use crate::{ids, map_transition_err};

/// A processor's decision on a pending refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundDecision {
    Approved,
    Rejected,
}

impl RefundDecision {
    fn status(self) -> RefundStatus {
        match self {
            RefundDecision::Approved => RefundStatus::Approved,
            RefundDecision::Rejected => RefundStatus::Rejected,
        }
    }
}

/// Applies and processes refunds.
#[derive(Clone)]
pub struct RefundWorkflow {
    stores: Stores,
}

impl RefundWorkflow {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Applies for a refund on a paid, shipped or completed order.
    ///
    /// At most one open refund may exist per order; the amount defaults to
    /// the full order total and may not exceed it.
    #[tracing::instrument(skip(self))]
    pub async fn apply_refund(
        &self,
        order_no: &OrderNo,
        user_id: UserId,
        reason: &str,
        amount: Option<Money>,
    ) -> Result<RefundOrder, OrderError> {
        if reason.trim().is_empty() {
            return Err(OrderError::validation("refund reason must not be empty"));
        }
        if let Some(amount) = amount
            && !amount.is_positive()
        {
            return Err(OrderError::validation("refund amount must be positive"));
        }

        let order = self
            .stores
            .orders
            .find(order_no)
            .await
            .map_err(OrderError::internal)?
            .ok_or_else(|| OrderError::not_found("order", order_no))?;

        if !order.is_owned_by(user_id) {
            return Err(OrderError::forbidden("order", order_no, user_id));
        }
        if !order.status.can_refund() {
            return Err(OrderError::conflict("apply refund", order.status));
        }

        if let Some(existing) = self
            .stores
            .refunds
            .find_open_by_order(order_no)
            .await
            .map_err(OrderError::internal)?
        {
            return Err(OrderError::conflict(
                "apply refund",
                format!("refund {} already open", existing.refund_no),
            ));
        }

        let amount = amount.unwrap_or(order.total_amount);
        if amount > order.total_amount {
            return Err(OrderError::validation(format!(
                "refund amount {amount} exceeds order total {}",
                order.total_amount
            )));
        }

        let now = Utc::now();
        let mut refund = RefundOrder {
            refund_no: ids::refund_no(),
            order_no: order_no.clone(),
            user_id,
            amount,
            status: RefundStatus::Pending,
            reason: reason.to_string(),
            processor: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut attempts = 0;
        loop {
            match self.stores.refunds.insert(refund.clone()).await {
                Ok(()) => break,
                Err(StoreError::Duplicate(_)) if attempts < 2 => {
                    attempts += 1;
                    refund.refund_no = ids::refund_no();
                }
                Err(err) => return Err(OrderError::internal(err)),
            }
        }

        // The order reads `refunded` from the moment of application. Losing
        // this transition means the order moved concurrently (e.g. a racing
        // cancellation); the refund stands and a processor will sort it out.
        if let Err(err) = self
            .stores
            .orders
            .transition(
                order_no,
                &[OrderStatus::Paid, OrderStatus::Shipped, OrderStatus::Completed],
                OrderUpdate::to(OrderStatus::Refunded),
            )
            .await
        {
            tracing::warn!(%order_no, %err, "order not marked refunded");
        }

        metrics::counter!("refunds_applied_total").increment(1);
        tracing::info!(refund_no = %refund.refund_no, %order_no, %amount, "refund applied");
        Ok(refund)
    }

    /// Approves or rejects a pending refund, stamping the processor and
    /// decision time. Rejection restores the order to `completed`.
    #[tracing::instrument(skip(self))]
    pub async fn process_refund(
        &self,
        refund_no: &RefundNo,
        processor_id: UserId,
        decision: RefundDecision,
        remark: Option<String>,
    ) -> Result<RefundOrder, OrderError> {
        let mut update = RefundUpdate::to(decision.status())
            .processor(format!("admin-{processor_id}"))
            .processed_at(Utc::now());
        if let Some(remark) = remark.filter(|r| !r.trim().is_empty()) {
            update = update.remark(remark);
        }

        let refund = self
            .stores
            .refunds
            .transition(refund_no, RefundStatus::Pending, update)
            .await
            .map_err(|e| map_transition_err(e, "process refund", "refund", refund_no.as_str()))?;

        if decision == RefundDecision::Rejected {
            if let Err(err) = self
                .stores
                .orders
                .transition(
                    &refund.order_no,
                    &[OrderStatus::Refunded],
                    OrderUpdate::to(OrderStatus::Completed),
                )
                .await
            {
                tracing::warn!(
                    order_no = %refund.order_no,
                    %err,
                    "order not restored after refund rejection"
                );
            }
        }

        tracing::info!(%refund_no, decision = ?decision, "refund processed");
        Ok(refund)
    }
}
