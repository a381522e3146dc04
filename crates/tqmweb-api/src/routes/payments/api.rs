//! Payment API endpoints - JSON API

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tqmweb_core::RecordPaymentRequest;

use crate::error::ApiResult;
use crate::routes::costs::api::parse_body;
use crate::AppState;

/// `POST /api/record_payment` with `{vendor, amount, date}`
pub async fn api_record_payment(State(state): State<AppState>, body: String) -> ApiResult<Json<Value>> {
    let request: RecordPaymentRequest = parse_body(&body)?;
    state.dashboard()?.record_payment(&request).await?;
    Ok(Json(json!({ "ok": true })))
}

/// `GET /api/get_payments`: the configured user's payments, newest first
pub async fn api_get_payments(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let history = state.dashboard()?.payment_history().await?;
    Ok(Json(json!({ "ok": true, "history": history })))
}
