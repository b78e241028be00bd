use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::PgConnection;
use std::collections::BTreeMap;

use super::config::ResourceConfig;
use super::{resolve_role, CrudContext};
use crate::database::dynamic;
use crate::database::relations::RelationDescriptor;
use crate::error::ApiError;
use crate::permissions::{check_has_permission_to_edit_columns, RelationRole};
use crate::query::{DeleteQuery, InsertQuery, LinkInsertQuery, UpdateQuery};

#[derive(Debug, Clone, Deserialize)]
pub struct PostBody {
    pub entry_data: Map<String, Value>,
    /// Ids of existing rows to link, keyed by nested relation name.
    #[serde(default)]
    pub linked_ids: BTreeMap<String, Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PutBody {
    pub entry_data: Map<String, Value>,
}

/// Check, complete and insert one entry; returns the new id.
pub(crate) async fn insert_entry(
    ctx: &CrudContext<'_>,
    conn: &mut PgConnection,
    resource: &ResourceConfig,
    relation: &'static RelationDescriptor,
    role: RelationRole,
    mut entry_data: Map<String, Value>,
) -> Result<i64, ApiError> {
    let columns: Vec<&String> = entry_data.keys().collect();
    check_has_permission_to_edit_columns(ctx.permissions, relation.name, role, &columns)?;

    if let Some(creator) = resource.creator_column {
        entry_data.insert(creator.to_string(), Value::from(ctx.access.user_id));
    }

    let sql = InsertQuery::new(relation, &entry_data)?.to_sql()?;
    Ok(dynamic::insert_returning_id(conn, &sql).await?)
}

pub async fn post(ctx: &CrudContext<'_>, resource: &ResourceConfig, body: PostBody) -> Result<Value, ApiError> {
    let relation = resource.descriptor()?;

    let mut links = Vec::new();
    for (name, ids) in &body.linked_ids {
        let nested = relation
            .nested(name)
            .ok_or_else(|| ApiError::bad_request(format!("'{}' cannot be linked to {}", name, relation.name)))?;
        links.extend(ids.iter().map(|target| (nested, *target)));
    }

    let mut tx = ctx.db.begin().await?;
    let role = resolve_role(ctx, &mut tx, relation, None).await?;
    let id = insert_entry(ctx, &mut tx, resource, relation, role, body.entry_data).await?;

    for (nested, target) in links {
        let sql = LinkInsertQuery::new(nested, id, target).to_sql()?;
        dynamic::execute(&mut tx, &sql).await?;
    }
    tx.commit().await?;

    tracing::info!(relation = relation.name, id, user_id = ctx.access.user_id, "created");
    Ok(json!({
        "message": format!("{} created", resource.entry_name),
        "id": id
    }))
}

pub async fn put(ctx: &CrudContext<'_>, resource: &ResourceConfig, id: i64, body: PutBody) -> Result<Value, ApiError> {
    let relation = resource.descriptor()?;
    let mut tx = ctx.db.begin().await?;
    let role = resolve_role(ctx, &mut tx, relation, Some(id)).await?;

    if let Some(check) = resource.update_check {
        if !check(role) {
            tracing::warn!(relation = relation.name, id, %role, "update refused");
            return Err(ApiError::forbidden(format!(
                "You do not have permission to update this {}",
                resource.entry_name.to_lowercase()
            )));
        }
    }

    let columns: Vec<&String> = body.entry_data.keys().collect();
    check_has_permission_to_edit_columns(ctx.permissions, relation.name, role, &columns)?;

    let sql = UpdateQuery::new(relation, id, &body.entry_data)?.to_sql()?;
    if dynamic::execute(&mut tx, &sql).await? == 0 {
        return Err(ApiError::not_found(format!("{} with id {} not found", resource.entry_name, id)));
    }
    tx.commit().await?;

    tracing::info!(relation = relation.name, id, user_id = ctx.access.user_id, "updated");
    Ok(json!({ "message": format!("{} updated", resource.entry_name) }))
}

pub async fn delete(ctx: &CrudContext<'_>, resource: &ResourceConfig, id: i64) -> Result<Value, ApiError> {
    let relation = resource.descriptor()?;
    let mut tx = ctx.db.begin().await?;
    let role = resolve_role(ctx, &mut tx, relation, Some(id)).await?;

    if let Some(check) = resource.delete_check {
        if !check(role) {
            tracing::warn!(relation = relation.name, id, %role, "delete refused");
            return Err(ApiError::forbidden(format!(
                "You do not have permission to delete this {}",
                resource.entry_name.to_lowercase()
            )));
        }
    }

    let sql = DeleteQuery::new(relation, id).to_sql()?;
    if dynamic::execute(&mut tx, &sql).await? == 0 {
        return Err(ApiError::not_found(format!("{} with id {} not found", resource.entry_name, id)));
    }
    tx.commit().await?;

    tracing::info!(relation = relation.name, id, user_id = ctx.access.user_id, "deleted");
    Ok(json!({ "message": format!("{} deleted", resource.entry_name) }))
}
