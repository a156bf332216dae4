//! Refund workflow endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderNo, RefundNo, UserId};
use domain::{Money, RefundStatus};
use engine::RefundDecision;
use serde::{Deserialize, Serialize};

use super::orders::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ApplyRefundRequest {
    pub order_no: String,
    pub user_id: i64,
    pub reason: String,
    pub amount_cents: Option<i64>,
}

#[derive(Deserialize)]
pub struct ProcessRefundRequest {
    pub processor_id: i64,
    pub action: RefundDecision,
    pub remark: Option<String>,
}

#[derive(Serialize)]
pub struct RefundResponse {
    pub refund_no: RefundNo,
    pub order_no: OrderNo,
    pub status: RefundStatus,
    pub amount_cents: i64,
}

/// POST /refunds — apply for a refund.
pub async fn apply(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ApplyRefundRequest>,
) -> Result<(StatusCode, Json<RefundResponse>), ApiError> {
    let refund = state
        .refunds
        .apply_refund(
            &OrderNo::new(req.order_no),
            UserId::new(req.user_id),
            &req.reason,
            req.amount_cents.map(Money::from_cents),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RefundResponse {
            amount_cents: refund.amount.cents(),
            refund_no: refund.refund_no,
            order_no: refund.order_no,
            status: refund.status,
        }),
    ))
}

/// POST /refunds/{refund_no}/process — approve or reject.
pub async fn process(
    State(state): State<Arc<AppState>>,
    Path(refund_no): Path<String>,
    Json(req): Json<ProcessRefundRequest>,
) -> Result<Json<RefundResponse>, ApiError> {
    let refund = state
        .refunds
        .process_refund(
            &RefundNo::new(refund_no),
            UserId::new(req.processor_id),
            req.action,
            req.remark,
        )
        .await?;

    Ok(Json(RefundResponse {
        amount_cents: refund.amount.cents(),
        refund_no: refund.refund_no,
        order_no: refund.order_no,
        status: refund.status,
    }))
}
