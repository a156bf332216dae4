//! Stock reservation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderNo, ProductId, ReserveId};
use domain::ReservationStatus;
use serde::{Deserialize, Serialize};

use super::orders::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ReserveStockRequest {
    pub order_no: String,
    pub product_id: i64,
    pub quantity: u32,
    pub ttl_secs: Option<i64>,
}

#[derive(Deserialize)]
pub struct ReleaseStockRequest {
    pub reserve_id: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
pub struct ConfirmStockRequest {
    pub order_no: String,
    pub reserve_id: String,
}

#[derive(Serialize)]
pub struct ReservationResponse {
    pub reserve_id: ReserveId,
    pub order_no: OrderNo,
    pub status: ReservationStatus,
    pub expire_time: DateTime<Utc>,
}

/// POST /stock/reserve — place a time-bounded hold.
pub async fn reserve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReserveStockRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let reservation = state
        .tracker
        .reserve(
            &OrderNo::new(req.order_no),
            ProductId::new(req.product_id),
            req.quantity,
            req.ttl_secs,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse {
            reserve_id: reservation.reserve_id,
            order_no: reservation.order_no,
            status: reservation.status,
            expire_time: reservation.expire_time,
        }),
    ))
}

/// POST /stock/release — give a hold back.
pub async fn release(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReleaseStockRequest>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reason = if req.reason.is_empty() {
        "released by caller".to_string()
    } else {
        req.reason
    };
    let reservation = state
        .tracker
        .release(&ReserveId::new(req.reserve_id), &reason)
        .await?;

    Ok(Json(ReservationResponse {
        reserve_id: reservation.reserve_id,
        order_no: reservation.order_no,
        status: reservation.status,
        expire_time: reservation.expire_time,
    }))
}

/// POST /stock/confirm — convert a hold into a deduction.
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConfirmStockRequest>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation = state
        .tracker
        .confirm(&OrderNo::new(req.order_no), &ReserveId::new(req.reserve_id))
        .await?;

    Ok(Json(ReservationResponse {
        reserve_id: reservation.reserve_id,
        order_no: reservation.order_no,
        status: reservation.status,
        expire_time: reservation.expire_time,
    }))
}
