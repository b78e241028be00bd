// handlers/public/mod.rs - Endpoints reachable without credentials
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::server::AppState;

/// GET / - Service information
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Data Catalog API",
        "version": version,
        "description": "Public records data catalog with column-level permissions",
        "endpoints": {
            "health": "/health (public)",
            "agencies": "/api/agencies[/:id] (protected)",
            "data_sources": "/api/data-sources[/:id], /api/data-sources/bulk (protected)",
            "data_requests": "/api/data-requests[/:id] (protected)",
            "locations": "/api/locations[/:id] (protected, read only)",
            "users": "/api/users/:id (protected)",
            "typeahead": "/api/typeahead/agencies, /api/typeahead/locations (protected)",
            "permissions": "/api/permissions/:relation (protected)",
            "api_key": "/api/user/api-key (protected, token only)"
        }
    }))
}

/// GET /health - Database connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
