//! Cost API endpoints - JSON API

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tqmweb_core::SaveCostRequest;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Parse a JSON request body, answering malformed input with a 400 in the API's own shape
pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}

/// `POST /api/save_cost` with `{key, product_cost, packaging, vendor}`
pub async fn api_save_cost(State(state): State<AppState>, body: String) -> ApiResult<Json<Value>> {
    let request: SaveCostRequest = parse_body(&body)?;
    state.dashboard()?.save_cost(&request).await?;
    Ok(Json(json!({ "ok": true })))
}
