use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::DatabaseError;
use crate::permissions::PermissionError;
use crate::query::QueryError;

/// Error returned to HTTP clients. Module errors convert into it with `?`;
/// anything internal is logged and replaced with a generic message.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    InternalServerError(String),
    ServiceUnavailable(String),
}

const GENERIC_FAILURE: &str = "An error occurred while processing your request";
const DATABASE_UNAVAILABLE: &str = "Database temporarily unavailable";

macro_rules! constructors {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            pub fn $name(message: impl Into<String>) -> Self {
                ApiError::$variant(message.into())
            }
        )*
    };
}

impl ApiError {
    constructors! {
        bad_request => BadRequest,
        invalid_json => InvalidJson,
        unauthorized => Unauthorized,
        forbidden => Forbidden,
        not_found => NotFound,
        conflict => Conflict,
        internal_server_error => InternalServerError,
        service_unavailable => ServiceUnavailable,
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::ValidationError { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::InvalidJson(_) => (StatusCode::BAD_REQUEST, "INVALID_JSON"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::InternalServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
            ApiError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.parts().0.as_u16()
    }

    pub fn error_code(&self) -> &'static str {
        self.parts().1
    }

    /// Client-safe message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError { message, .. } => message,
            ApiError::BadRequest(message)
            | ApiError::InvalidJson(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::InternalServerError(message)
            | ApiError::ServiceUnavailable(message) => message,
        }
    }

    /// `{message, code}` plus `field_errors` for validation failures.
    pub fn to_json(&self) -> Value {
        let mut body = json!({ "message": self.message(), "code": self.error_code() });
        if let ApiError::ValidationError {
            field_errors: Some(fields),
            ..
        } = self
        {
            body["field_errors"] = json!(fields);
        }
        body
    }
}

impl From<PermissionError> for ApiError {
    fn from(err: PermissionError) -> Self {
        match err {
            PermissionError::ForbiddenColumns { .. } => ApiError::forbidden(err.to_string()),
            PermissionError::UnknownRole(_) | PermissionError::UnknownAccessLevel(_) => {
                ApiError::bad_request(err.to_string())
            }
            PermissionError::UnknownRelation(_) | PermissionError::UnknownColumn { .. } | PermissionError::Source(_) => {
                tracing::error!("Permission table error: {}", err);
                ApiError::internal_server_error(GENERIC_FAILURE)
            }
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NoColumns(_) => ApiError::forbidden(err.to_string()),
            QueryError::InvalidValue { ref column, ref reason } => {
                let mut field_errors = HashMap::new();
                field_errors.insert(column.clone(), reason.clone());
                ApiError::validation_error("Invalid field value", Some(field_errors))
            }
            _ => ApiError::bad_request(err.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::UniqueViolation(msg) => {
                tracing::warn!("Unique violation: {}", msg);
                ApiError::conflict("An entry with the same value already exists")
            }
            DatabaseError::ForeignKeyViolation(msg) => {
                tracing::warn!("Foreign key violation: {}", msg);
                ApiError::bad_request("A referenced entry was not found")
            }
            DatabaseError::InvalidInput(msg) => ApiError::bad_request(msg),
            DatabaseError::Unavailable(msg) => {
                tracing::error!("Database unavailable: {}", msg);
                ApiError::service_unavailable(DATABASE_UNAVAILABLE)
            }
            DatabaseError::QueryError(_) | DatabaseError::Sqlx(_) => {
                tracing::error!("Database error: {}", err);
                ApiError::internal_server_error(GENERIC_FAILURE)
            }
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database configuration error: {}", err);
                ApiError::service_unavailable(DATABASE_UNAVAILABLE)
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::bad_request(format!("Invalid CSV: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.parts().0, Json(self.to_json())).into_response()
    }
}
