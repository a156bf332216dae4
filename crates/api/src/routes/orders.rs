//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderNo, ProductId, UserId};
use domain::{Money, OrderStatus};
use engine::{
    NewOrder, NewOrderItem, OrderDetail, OrderLifecycle, OrderStats, RefundWorkflow,
    ReservationTracker, TimeoutDispatcher,
};
use serde::{Deserialize, Serialize};
use store::{OrderFilter, TimeRange};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub lifecycle: OrderLifecycle,
    pub tracker: ReservationTracker,
    pub dispatcher: TimeoutDispatcher,
    pub refunds: RefundWorkflow,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: i64,
    pub items: Vec<OrderItemRequest>,
    pub address: String,
    pub phone: String,
    pub receiver: Option<String>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: i64,
    /// Fallback name used when the catalog is unreachable.
    #[serde(default)]
    pub product_name: String,
    /// Fallback price (cents) used when the catalog is unreachable.
    #[serde(default)]
    pub unit_price_cents: i64,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub user_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub user_id: i64,
    pub status: Option<OrderStatus>,
    /// Unix seconds, inclusive.
    pub start_time: Option<i64>,
    /// Unix seconds, inclusive.
    pub end_time: Option<i64>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    OrderFilter::DEFAULT_PAGE_SIZE
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub user_id: i64,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

#[derive(Deserialize)]
pub struct PayOrderRequest {
    pub user_id: i64,
    pub payment_no: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelOrderRequest {
    pub user_id: i64,
    pub reason: String,
}

#[derive(Deserialize)]
pub struct ShipOrderRequest {
    pub shipping_no: String,
}

#[derive(Deserialize)]
pub struct ConfirmReceiptRequest {
    pub user_id: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CreateOrderResponse {
    pub order_no: OrderNo,
    pub total_amount_cents: i64,
    pub payment_url: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub order_no: OrderNo,
    pub status: OrderStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderDetail>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

fn time_range(start_time: Option<i64>, end_time: Option<i64>) -> Result<Option<TimeRange>, ApiError> {
    if start_time.is_none() && end_time.is_none() {
        return Ok(None);
    }
    let convert = |secs: i64| {
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid unix timestamp {secs}")))
    };
    Ok(Some(TimeRange {
        start: start_time.map(convert).transpose()?,
        end: end_time.map(convert).transpose()?,
    }))
}

// -- Handlers --

/// POST /orders — create a new order.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let request = NewOrder {
        user_id: UserId::new(req.user_id),
        items: req
            .items
            .into_iter()
            .map(|item| NewOrderItem {
                product_id: ProductId::new(item.product_id),
                product_name: item.product_name,
                unit_price: Money::from_cents(item.unit_price_cents),
                quantity: item.quantity,
            })
            .collect(),
        address: req.address,
        phone: req.phone,
        receiver: req.receiver,
    };

    let receipt = state.lifecycle.create_order(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            total_amount_cents: receipt.total_amount.cents(),
            payment_url: receipt.payment_url,
            order_no: receipt.order_no,
        }),
    ))
}

/// GET /orders/{order_no} — load one order with its items.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(order_no): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<OrderDetail>, ApiError> {
    let detail = state
        .lifecycle
        .get_order(&OrderNo::new(order_no), query.user_id.map(UserId::new))
        .await?;
    Ok(Json(detail))
}

/// GET /orders — list a user's orders.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<ListOrdersResponse>, ApiError> {
    let mut filter = OrderFilter::for_user(UserId::new(query.user_id))
        .with_page(query.page, query.page_size);
    if let Some(status) = query.status {
        filter = filter.with_status(status);
    }
    if let Some(range) = time_range(query.start_time, query.end_time)? {
        filter = filter.with_range(range);
    }

    let (orders, total) = state.lifecycle.list_orders(&filter).await?;
    Ok(Json(ListOrdersResponse {
        orders,
        total,
        page: filter.page,
        page_size: filter.page_size,
    }))
}

/// GET /orders/stats — per-user order statistics.
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<OrderStats>, ApiError> {
    let range = time_range(query.start_time, query.end_time)?;
    let stats = state
        .lifecycle
        .order_stats(UserId::new(query.user_id), range)
        .await?;
    Ok(Json(stats))
}

/// POST /orders/{order_no}/pay — mark an order paid.
pub async fn pay(
    State(state): State<Arc<AppState>>,
    Path(order_no): Path<String>,
    Json(req): Json<PayOrderRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let order = state
        .lifecycle
        .pay_order(&OrderNo::new(order_no), UserId::new(req.user_id), req.payment_no)
        .await?;
    Ok(Json(StatusResponse {
        order_no: order.order_no,
        status: order.status,
        paid_at: order.paid_at,
        cancelled_at: order.cancelled_at,
    }))
}

/// POST /orders/{order_no}/cancel — cancel and compensate.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(order_no): Path<String>,
    Json(req): Json<CancelOrderRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let order = state
        .lifecycle
        .cancel_order(&OrderNo::new(order_no), UserId::new(req.user_id), &req.reason)
        .await?;
    Ok(Json(StatusResponse {
        order_no: order.order_no,
        status: order.status,
        paid_at: order.paid_at,
        cancelled_at: order.cancelled_at,
    }))
}

/// POST /orders/{order_no}/ship — record shipment.
pub async fn ship(
    State(state): State<Arc<AppState>>,
    Path(order_no): Path<String>,
    Json(req): Json<ShipOrderRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let order = state
        .lifecycle
        .ship_order(&OrderNo::new(order_no), &req.shipping_no)
        .await?;
    Ok(Json(StatusResponse {
        order_no: order.order_no,
        status: order.status,
        paid_at: order.paid_at,
        cancelled_at: order.cancelled_at,
    }))
}

/// POST /orders/{order_no}/receipt — confirm receipt.
pub async fn receipt(
    State(state): State<Arc<AppState>>,
    Path(order_no): Path<String>,
    Json(req): Json<ConfirmReceiptRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let order = state
        .lifecycle
        .confirm_receipt(&OrderNo::new(order_no), UserId::new(req.user_id))
        .await?;
    Ok(Json(StatusResponse {
        order_no: order.order_no,
        status: order.status,
        paid_at: order.paid_at,
        cancelled_at: order.cancelled_at,
    }))
}
