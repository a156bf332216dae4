//! Timeout compensation endpoint, invoked by the external scheduler.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::TaskId;
use domain::TimeoutKind;
use engine::TimeoutReport;
use serde::Deserialize;

use super::orders::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ProcessTimeoutRequest {
    pub task_id: String,
    pub kind: TimeoutKind,
}

/// POST /timeouts/process — replay the compensating action for a due task.
pub async fn process(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessTimeoutRequest>,
) -> Result<Json<TimeoutReport>, ApiError> {
    let report = state
        .dispatcher
        .process(&TaskId::new(req.task_id), req.kind)
        .await?;
    Ok(Json(report))
}
