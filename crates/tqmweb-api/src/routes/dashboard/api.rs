//! Dashboard API endpoints - JSON API

use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};
use tqmweb_core::DashboardReport;

use crate::error::ApiResult;
use crate::routes::WindowQuery;
use crate::AppState;

/// `GET /api/report?from&to`: orders and stats as JSON
pub async fn api_report(State(state): State<AppState>, Query(query): Query<WindowQuery>) -> ApiResult<Json<DashboardReport>> {
    let report = state.dashboard()?.build_report(query.window()).await?;
    Ok(Json(report))
}

/// `POST /api/refresh`: re-run order ingestion
pub async fn api_refresh(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let count = state.dashboard()?.refresh().await?;
    Ok(Json(json!({ "ok": true, "orders": count })))
}
