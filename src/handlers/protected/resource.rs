//! Generic handlers for governed relations. Each route picks its
//! [`ResourceConfig`] through a [`Resource`] marker type.

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, Query, State},
    Extension,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use crate::auth::AccessInfo;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::crud::{self, config, ListParams, PostBody, PutBody, ResourceConfig};
use crate::services::CrudContext;

pub trait Resource: Send + Sync + 'static {
    const CONFIG: ResourceConfig;
}

pub struct Agencies;
pub struct DataSources;
pub struct DataRequests;
pub struct Locations;
pub struct Users;

impl Resource for Agencies {
    const CONFIG: ResourceConfig = config::AGENCIES;
}

impl Resource for DataSources {
    const CONFIG: ResourceConfig = config::DATA_SOURCES;
}

impl Resource for DataRequests {
    const CONFIG: ResourceConfig = config::DATA_REQUESTS;
}

impl Resource for Locations {
    const CONFIG: ResourceConfig = config::LOCATIONS;
}

impl Resource for Users {
    const CONFIG: ResourceConfig = config::USERS;
}

fn context<'a>(state: &'a AppState, access: &'a AccessInfo) -> CrudContext<'a> {
    CrudContext {
        db: &state.db,
        permissions: &state.permissions,
        access,
    }
}

pub(crate) fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    let Path(id) = path.map_err(|_| ApiError::bad_request("Resource id must be an integer"))?;
    Ok(id)
}

/// Parse a JSON body ourselves so malformed input uses the API error shape.
pub(crate) fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_json(format!("Invalid request body: {}", e)))
}

/// GET /api/<resource>
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Extension(access): Extension<AccessInfo>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Value> {
    let params = ListParams::from_query(&R::CONFIG, &query)?;
    let body = crud::get_many(&context(&state, &access), &R::CONFIG, params).await?;
    Ok(ApiResponse::success(body))
}

/// GET /api/<resource>/:id
pub async fn show<R: Resource>(
    State(state): State<AppState>,
    Extension(access): Extension<AccessInfo>,
    path: Result<Path<i64>, PathRejection>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Value> {
    let id = path_id(path)?;
    let mut requested = None;
    for (key, value) in &query {
        match key.as_str() {
            "requested_columns" => {
                requested = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>(),
                )
                .filter(|columns| !columns.is_empty());
            }
            other => return Err(ApiError::bad_request(format!("Unknown query parameter: {}", other))),
        }
    }
    let body = crud::get_by_id(&context(&state, &access), &R::CONFIG, id, requested.as_deref()).await?;
    Ok(ApiResponse::success(body))
}

/// POST /api/<resource>
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(access): Extension<AccessInfo>,
    body: Bytes,
) -> ApiResult<Value> {
    let body: PostBody = json_body(&body)?;
    let response = crud::post(&context(&state, &access), &R::CONFIG, body).await?;
    Ok(ApiResponse::success(response))
}

/// PUT /api/<resource>/:id
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Extension(access): Extension<AccessInfo>,
    path: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> ApiResult<Value> {
    let id = path_id(path)?;
    let body: PutBody = json_body(&body)?;
    let response = crud::put(&context(&state, &access), &R::CONFIG, id, body).await?;
    Ok(ApiResponse::success(response))
}

/// DELETE /api/<resource>/:id
pub async fn remove<R: Resource>(
    State(state): State<AppState>,
    Extension(access): Extension<AccessInfo>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let id = path_id(path)?;
    let response = crud::delete(&context(&state, &access), &R::CONFIG, id).await?;
    Ok(ApiResponse::success(response))
}

/// POST /api/<resource>/bulk with a CSV body
pub async fn bulk<R: Resource>(
    State(state): State<AppState>,
    Extension(access): Extension<AccessInfo>,
    body: String,
) -> ApiResult<Value> {
    let response = crud::bulk_insert(&context(&state, &access), &R::CONFIG, &body).await?;
    Ok(ApiResponse::success(response))
}
