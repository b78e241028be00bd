use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};

use crate::auth::AccessInfo;
use crate::database::relations;
use crate::middleware::{ApiResponse, ApiResult};
use crate::permissions::{permitted_columns, role_without_resource, AccessLevel};
use crate::server::AppState;

/// GET /api/permissions/:relation - Columns the caller may read and write
pub async fn permitted(
    State(state): State<AppState>,
    Extension(access): Extension<AccessInfo>,
    Path(relation_name): Path<String>,
) -> ApiResult<Value> {
    let relation = relations::require_relation(&relation_name)?;

    let role = role_without_resource(&access);

    let read = permitted_columns(&state.permissions, relation.name, role, AccessLevel::Read)?;
    let write = permitted_columns(&state.permissions, relation.name, role, AccessLevel::Write)?;

    Ok(ApiResponse::success(json!({
        "relation": relation.name,
        "role": role,
        "read": read,
        "write": write
    })))
}
