use std::collections::HashSet;

use super::error::PermissionError;
use super::table::PermissionTable;
use super::types::{AccessLevel, RelationRole};

/// Columns of `relation` the role may access at `access_level`, in
/// declaration order. READ includes WRITE columns; NONE yields nothing.
pub fn permitted_columns(
    table: &PermissionTable,
    relation: &str,
    role: RelationRole,
    access_level: AccessLevel,
) -> Result<Vec<String>, PermissionError> {
    let permissions = table.relation(relation)?;
    Ok(permissions
        .columns
        .iter()
        .filter(|(_, p)| p.level(role).grants(access_level))
        .map(|(column, _)| column.clone())
        .collect())
}

/// Fails with `ForbiddenColumns` naming every requested column the role
/// cannot write.
pub fn check_has_permission_to_edit_columns<S: AsRef<str>>(
    table: &PermissionTable,
    relation: &str,
    role: RelationRole,
    columns: &[S],
) -> Result<(), PermissionError> {
    let writable = permitted_columns(table, relation, role, AccessLevel::Write)?;
    check_subset(relation, "edit", &writable, columns)
}

/// Columns to read for a request: all readable columns when nothing was
/// requested, otherwise exactly the requested ones (deduplicated), failing
/// closed if any of them is not readable.
pub fn resolve_read_columns<S: AsRef<str>>(
    table: &PermissionTable,
    relation: &str,
    role: RelationRole,
    requested: Option<&[S]>,
) -> Result<Vec<String>, PermissionError> {
    let readable = permitted_columns(table, relation, role, AccessLevel::Read)?;
    let Some(requested) = requested else {
        return Ok(readable);
    };

    check_subset(relation, "read", &readable, requested)?;

    let mut seen = HashSet::new();
    Ok(requested
        .iter()
        .map(|c| c.as_ref().to_string())
        .filter(|c| seen.insert(c.clone()))
        .collect())
}

fn check_subset<S: AsRef<str>>(
    relation: &str,
    action: &'static str,
    permitted: &[String],
    columns: &[S],
) -> Result<(), PermissionError> {
    let permitted: HashSet<&str> = permitted.iter().map(String::as_str).collect();
    let mut invalid: Vec<String> = Vec::new();
    for column in columns {
        let column = column.as_ref();
        if !permitted.contains(column) && !invalid.iter().any(|c| c == column) {
            invalid.push(column.to_string());
        }
    }

    if invalid.is_empty() {
        Ok(())
    } else {
        tracing::debug!("Rejecting {} of {:?} on {}", action, invalid, relation);
        Err(PermissionError::ForbiddenColumns {
            relation: relation.to_string(),
            action,
            columns: invalid,
        })
    }
}
