use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::auth::AccessInfo;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::issue_api_key;

/// POST /api/user/api-key - Issue a fresh API key for the caller
pub async fn create_api_key(
    State(state): State<AppState>,
    Extension(access): Extension<AccessInfo>,
) -> ApiResult<Value> {
    let api_key = issue_api_key(&state.db, &access).await?;
    Ok(ApiResponse::success(json!({
        "message": "API key created",
        "api_key": api_key
    })))
}
