use serde_json::{json, Value};

use super::config::ResourceConfig;
use super::pagination::{page_offset, resolve_limit};
use super::params::ListParams;
use super::{nest_readable, resolve_role, CrudContext};
use crate::database::dynamic;
use crate::error::ApiError;
use crate::permissions::resolve_read_columns;
use crate::database::RelationDescriptor;
use crate::query::{ConditionOp, OrderInfo, SelectQuery, SortDirection};

/// Split a column request into plain columns and nested relation names.
fn split_requested(
    relation: &RelationDescriptor,
    requested: Option<&[String]>,
) -> (Option<Vec<String>>, Option<Vec<String>>) {
    match requested {
        None => (None, None),
        Some(requested) => {
            let (nested, columns): (Vec<String>, Vec<String>) =
                requested.iter().cloned().partition(|name| relation.nested(name).is_some());
            (Some(columns), Some(nested))
        }
    }
}

/// The requested sort followed by the id column, so pages are stable.
fn list_order(relation: &RelationDescriptor, sort_by: Option<String>, sort: SortDirection) -> Vec<OrderInfo> {
    let mut order = Vec::with_capacity(2);
    if let Some(column) = sort_by {
        order.push(OrderInfo { column, sort });
    }
    if !order.iter().any(|o| o.column == relation.id_column) {
        order.push(OrderInfo {
            column: relation.id_column.to_string(),
            sort: SortDirection::Asc,
        });
    }
    order
}

/// List rows of a resource visible to the caller.
pub async fn get_many(ctx: &CrudContext<'_>, resource: &ResourceConfig, params: ListParams) -> Result<Value, ApiError> {
    let relation = resource.descriptor()?;
    let settings = &crate::config::config().pagination;
    let limit = resolve_limit(params.limit, settings.page_size, settings.max_limit)?;
    let offset = page_offset(params.page, limit)?;
    if settings.debug_logging {
        tracing::debug!(relation = relation.name, page = params.page, limit, offset, "pagination");
    }

    let mut tx = ctx.db.begin().await?;
    let role = resolve_role(ctx, &mut tx, relation, None).await?;

    let (requested, nested_only) = split_requested(relation, params.requested_columns.as_deref());
    let columns = resolve_read_columns(ctx.permissions, relation.name, role, requested.as_deref())?;

    // Filtering or sorting on a column is a read of that column.
    let mut touched: Vec<&str> = params.filters.iter().map(|(column, _)| column.as_str()).collect();
    if let Some(sort_by) = params.sort_by.as_deref() {
        touched.push(sort_by);
    }
    if !touched.is_empty() {
        resolve_read_columns(ctx.permissions, relation.name, role, Some(touched.as_slice()))?;
    }

    let mut query = SelectQuery::new(relation);
    query.select(&columns)?;
    nest_readable(&mut query, ctx.permissions, relation, role, nested_only.as_deref())?;
    for (column, value) in &params.filters {
        query.filter(column, ConditionOp::Eq, Value::String(value.clone()))?;
    }
    query.order(list_order(relation, params.sort_by, params.sort_order))?;
    query.limit(limit, Some(offset))?;

    let sql = query.to_sql()?;
    let rows = dynamic::fetch_rows(&mut tx, &sql).await?;
    tx.commit().await?;

    let count = rows.len();
    Ok(json!({
        "message": format!("{} found", resource.plural_name),
        "data": rows,
        "metadata": { "count": count }
    }))
}

/// Fetch one row, with the caller's role evaluated against that row.
pub async fn get_by_id(
    ctx: &CrudContext<'_>,
    resource: &ResourceConfig,
    id: i64,
    requested_columns: Option<&[String]>,
) -> Result<Value, ApiError> {
    let relation = resource.descriptor()?;
    let mut tx = ctx.db.begin().await?;
    let role = resolve_role(ctx, &mut tx, relation, Some(id)).await?;

    let (requested, nested_only) = split_requested(relation, requested_columns);
    let columns = resolve_read_columns(ctx.permissions, relation.name, role, requested.as_deref())?;

    let mut query = SelectQuery::new(relation);
    query.select(&columns)?;
    nest_readable(&mut query, ctx.permissions, relation, role, nested_only.as_deref())?;
    query.where_id(id)?;

    let sql = query.to_sql()?;
    let row = dynamic::fetch_optional_row(&mut tx, &sql).await?;
    tx.commit().await?;

    match row {
        Some(data) => Ok(json!({
            "message": format!("{} found", resource.entry_name),
            "data": data
        })),
        None => Err(ApiError::not_found(format!("{} with id {} not found", resource.entry_name, id))),
    }
}
