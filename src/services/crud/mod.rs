//! Generic CRUD orchestration over governed relations.
//!
//! Each operation runs `authorize -> resolve columns -> build query ->
//! execute -> format response` inside one transaction. Returning early
//! drops the transaction, which rolls it back.

pub mod bulk;
pub mod config;
pub mod pagination;
pub mod params;
pub mod read;
pub mod write;

pub use bulk::bulk_insert;
pub use config::ResourceConfig;
pub use pagination::{get_offset, PAGE_SIZE};
pub use params::ListParams;
pub use read::{get_by_id, get_many};
pub use write::{delete, post, put, PostBody, PutBody};

use sqlx::PgConnection;

use crate::auth::AccessInfo;
use crate::database::relations::RelationDescriptor;
use crate::database::{DatabaseClient, RelationOwnership};
use crate::error::ApiError;
use crate::permissions::{get_relation_role, permitted_columns, AccessLevel, PermissionTable, RelationRole};
use crate::query::SelectQuery;

/// What every orchestrator needs from the request.
#[derive(Clone, Copy)]
pub struct CrudContext<'a> {
    pub db: &'a DatabaseClient,
    pub permissions: &'a PermissionTable,
    pub access: &'a AccessInfo,
}

pub(crate) async fn resolve_role(
    ctx: &CrudContext<'_>,
    conn: &mut PgConnection,
    relation: &'static RelationDescriptor,
    resource_id: Option<i64>,
) -> Result<RelationRole, ApiError> {
    let mut ownership = RelationOwnership::new(conn, relation);
    let role = get_relation_role(ctx.access, resource_id, &mut ownership).await?;
    tracing::debug!(relation = relation.name, user_id = ctx.access.user_id, %role, "resolved role");
    Ok(role)
}

/// Add every nested relation the role can read at least one column of.
pub(crate) fn nest_readable(
    query: &mut SelectQuery,
    permissions: &PermissionTable,
    relation: &RelationDescriptor,
    role: RelationRole,
    only: Option<&[String]>,
) -> Result<(), ApiError> {
    for nested in relation.nested {
        if let Some(only) = only {
            if !only.iter().any(|name| name == nested.name) {
                continue;
            }
        }
        let columns = permitted_columns(permissions, nested.relation, role.for_nested(), AccessLevel::Read)?;
        query.nest(nested.name, &columns)?;
    }
    Ok(())
}
