use crate::auth::{generate_api_key, hash_api_key, AccessInfo, AccessType};
use crate::database::{users, DatabaseClient};
use crate::error::ApiError;

/// Issue a new API key for the caller. Only the digest is stored; the
/// plain key is returned once.
pub async fn issue_api_key(db: &DatabaseClient, access: &AccessInfo) -> Result<String, ApiError> {
    if access.access_type == AccessType::ApiKey {
        return Err(ApiError::forbidden("API keys can only be issued to token-authenticated users"));
    }

    let key = generate_api_key();
    users::set_api_key_digest(db.pool(), access.user_id, &hash_api_key(&key)).await?;
    tracing::info!(user_id = access.user_id, "issued API key");
    Ok(key)
}
