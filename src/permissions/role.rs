use async_trait::async_trait;

use super::types::{PermissionBit, RelationRole};
use crate::auth::{AccessInfo, AccessType};
use crate::database::DatabaseError;

/// Answers "does this user own that row?" for one relation.
#[async_trait]
pub trait OwnershipLookup: Send {
    async fn is_owner(&mut self, user_id: i64, resource_id: i64) -> Result<bool, DatabaseError>;
}

/// The caller's role when no particular row is involved: ADMIN for
/// `DB_WRITE` holders using a token, STANDARD for everyone else.
pub fn role_without_resource(access: &AccessInfo) -> RelationRole {
    if access.access_type != AccessType::ApiKey && access.has_permission(PermissionBit::DbWrite) {
        RelationRole::Admin
    } else {
        RelationRole::Standard
    }
}

/// Derive the caller's role for a relation, optionally relative to one row.
///
/// API-key callers are always STANDARD. Holders of `DB_WRITE` are ADMIN.
/// Otherwise the caller is OWNER when a resource id is given and the
/// lookup confirms ownership. Lookup errors are returned as-is.
pub async fn get_relation_role<L>(
    access: &AccessInfo,
    resource_id: Option<i64>,
    lookup: &mut L,
) -> Result<RelationRole, DatabaseError>
where
    L: OwnershipLookup + ?Sized,
{
    let role = role_without_resource(access);
    if role == RelationRole::Admin || access.access_type == AccessType::ApiKey {
        return Ok(role);
    }
    if let Some(resource_id) = resource_id {
        if lookup.is_owner(access.user_id, resource_id).await? {
            return Ok(RelationRole::Owner);
        }
    }
    Ok(RelationRole::Standard)
}
