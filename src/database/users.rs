use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::client::DatabaseError;
use crate::permissions::PermissionBit;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
}

const USER_COLUMNS: &str = "CAST(id AS bigint) AS id, email, created_at";

/// Look up the user whose stored API key digest matches.
pub async fn find_by_api_key_digest(pool: &PgPool, digest: &str) -> Result<Option<UserRecord>, DatabaseError> {
    let user = sqlx::query_as::<_, UserRecord>(&format!("SELECT {} FROM users WHERE api_key = $1", USER_COLUMNS))
        .bind(digest)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, user_id: i64) -> Result<Option<UserRecord>, DatabaseError> {
    let user = sqlx::query_as::<_, UserRecord>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Permission bits granted to a user. Unrecognized names are skipped.
pub async fn load_permissions(pool: &PgPool, user_id: i64) -> Result<Vec<PermissionBit>, DatabaseError> {
    let names: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT p.permission_name
        FROM user_permissions up
        JOIN permissions p ON p.permission_id = up.permission_id
        WHERE up.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut bits = Vec::with_capacity(names.len());
    for name in names {
        match PermissionBit::from_name(&name) {
            Some(bit) if !bits.contains(&bit) => bits.push(bit),
            Some(_) => {}
            None => tracing::warn!("Ignoring unknown permission '{}' for user {}", name, user_id),
        }
    }
    Ok(bits)
}

/// Replace the stored API key digest for a user.
pub async fn set_api_key_digest(pool: &PgPool, user_id: i64, digest: &str) -> Result<(), DatabaseError> {
    let result = sqlx::query("UPDATE users SET api_key = $1, updated_at = now() WHERE id = $2")
        .bind(digest)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound(format!("User {} not found", user_id)));
    }
    Ok(())
}
