use axum::{
    extract::{Query, State},
    Extension,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::AccessInfo;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::typeahead::{self, TypeaheadTarget};
use crate::services::CrudContext;

#[derive(Debug, Deserialize)]
pub struct TypeaheadQuery {
    #[serde(default)]
    pub query: String,
}

async fn suggest(state: AppState, access: AccessInfo, target: &TypeaheadTarget, query: &str) -> ApiResult<Value> {
    let ctx = CrudContext {
        db: &state.db,
        permissions: &state.permissions,
        access: &access,
    };
    Ok(ApiResponse::success(typeahead::suggest(&ctx, target, query).await?))
}

/// GET /api/typeahead/agencies?query=
pub async fn agencies(
    State(state): State<AppState>,
    Extension(access): Extension<AccessInfo>,
    Query(params): Query<TypeaheadQuery>,
) -> ApiResult<Value> {
    suggest(state, access, &typeahead::AGENCIES, &params.query).await
}

/// GET /api/typeahead/locations?query=
pub async fn locations(
    State(state): State<AppState>,
    Extension(access): Extension<AccessInfo>,
    Query(params): Query<TypeaheadQuery>,
) -> ApiResult<Value> {
    suggest(state, access, &typeahead::LOCATIONS, &params.query).await
}
