use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{decode_jwt, hash_api_key, AccessInfo, AccessType};
use crate::database::users;
use crate::error::ApiError;
use crate::server::AppState;

/// Credentials as presented in the `Authorization` header.
#[derive(Debug, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    Bearer(String),
}

/// Resolves the caller and attaches an [`AccessInfo`] to the request.
pub async fn access_info_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credentials = parse_authorization(request.headers()).map_err(ApiError::unauthorized)?;
    let access = resolve_access(&state, credentials).await?;

    tracing::debug!(user_id = access.user_id, access_type = ?access.access_type, "authenticated");
    request.extensions_mut().insert(access);
    Ok(next.run(request).await)
}

pub fn parse_authorization(headers: &HeaderMap) -> Result<Credentials, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    let (scheme, value) = auth_str
        .split_once(' ')
        .ok_or_else(|| "Authorization header must be 'Basic <api_key>' or 'Bearer <token>'".to_string())?;
    let value = value.trim();
    if value.is_empty() {
        return Err("Empty credentials".to_string());
    }

    if scheme.eq_ignore_ascii_case("basic") {
        Ok(Credentials::ApiKey(value.to_string()))
    } else if scheme.eq_ignore_ascii_case("bearer") {
        Ok(Credentials::Bearer(value.to_string()))
    } else {
        Err(format!("Unsupported authorization scheme: {}", scheme))
    }
}

async fn resolve_access(state: &AppState, credentials: Credentials) -> Result<AccessInfo, ApiError> {
    let pool = state.db.pool();
    let (user, access_type) = match credentials {
        Credentials::ApiKey(key) => {
            let user = users::find_by_api_key_digest(pool, &hash_api_key(&key))
                .await?
                .ok_or_else(|| {
                    tracing::warn!("Rejected unknown API key");
                    ApiError::unauthorized("Invalid API key")
                })?;
            (user, AccessType::ApiKey)
        }
        Credentials::Bearer(token) => {
            let claims = decode_jwt(&token).map_err(|e| ApiError::unauthorized(e.to_string()))?;
            let user = users::find_by_id(pool, claims.user_id).await?.ok_or_else(|| {
                tracing::warn!("Token for unknown user {}", claims.user_id);
                ApiError::unauthorized("User not found")
            })?;
            (user, AccessType::Jwt)
        }
    };

    let permissions = users::load_permissions(pool, user.id).await?;
    Ok(AccessInfo {
        user_id: user.id,
        user_email: user.email,
        access_type,
        permissions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_both_schemes() {
        assert_eq!(parse_authorization(&headers("Basic abc123")), Ok(Credentials::ApiKey("abc123".to_string())));
        assert_eq!(parse_authorization(&headers("Bearer a.b.c")), Ok(Credentials::Bearer("a.b.c".to_string())));
        assert_eq!(parse_authorization(&headers("bearer a.b.c")), Ok(Credentials::Bearer("a.b.c".to_string())));
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert!(parse_authorization(&HeaderMap::new()).is_err());
        assert!(parse_authorization(&headers("Bearer")).is_err());
        assert!(parse_authorization(&headers("Bearer   ")).is_err());
        assert!(parse_authorization(&headers("Digest xyz")).is_err());
    }
}
