use serde_json::{json, Value};

use super::crud::{resolve_role, CrudContext};
use crate::database::dynamic;
use crate::database::relations::{self, RelationDescriptor};
use crate::error::ApiError;
use crate::permissions::{permitted_columns, AccessLevel, PermissionError};
use crate::query::{ConditionOp, OrderInfo, SelectQuery, SortDirection};

pub const SUGGESTION_LIMIT: i64 = 10;

/// A relation searchable by prefix-insensitive name match.
#[derive(Debug, Clone, Copy)]
pub struct TypeaheadTarget {
    pub relation: &'static RelationDescriptor,
    pub display_column: &'static str,
}

pub const AGENCIES: TypeaheadTarget = TypeaheadTarget {
    relation: &relations::AGENCIES,
    display_column: "name",
};

pub const LOCATIONS: TypeaheadTarget = TypeaheadTarget {
    relation: &relations::LOCATIONS,
    display_column: "display_name",
};

/// `%query%` with LIKE wildcards in the input escaped.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub async fn suggest(ctx: &CrudContext<'_>, target: &TypeaheadTarget, query: &str) -> Result<Value, ApiError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("'query' must not be empty"));
    }

    let relation = target.relation;
    let mut tx = ctx.db.begin().await?;
    let role = resolve_role(ctx, &mut tx, relation, None).await?;

    let columns = permitted_columns(ctx.permissions, relation.name, role, AccessLevel::Read)?;
    if !columns.iter().any(|c| c == target.display_column) {
        return Err(PermissionError::ForbiddenColumns {
            relation: relation.name.to_string(),
            action: "read",
            columns: vec![target.display_column.to_string()],
        }
        .into());
    }

    let mut select = SelectQuery::new(relation);
    select
        .select(&columns)?
        .filter(target.display_column, ConditionOp::ILike, Value::String(like_pattern(query)))?
        .order(vec![OrderInfo {
            column: target.display_column.to_string(),
            sort: SortDirection::Asc,
        }])?
        .limit(SUGGESTION_LIMIT, None)?;

    let sql = select.to_sql()?;
    let rows = dynamic::fetch_rows(&mut tx, &sql).await?;
    tx.commit().await?;

    Ok(json!({
        "message": "Suggestions found",
        "suggestions": rows
    }))
}
