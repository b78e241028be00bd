//! Loading the permission table from its configured source.
//!
//! The compiled-in table is the default. The database mirror
//! (`relation_column` + `column_permission`) and YAML exports can replace
//! it; either way the result is validated against the relation
//! descriptors before the server accepts traffic.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use std::path::Path;

use super::error::PermissionError;
use super::table::PermissionTable;
use super::types::{AccessLevel, ColumnPermissions, RelationRole};
use crate::config::PermissionSource;
use crate::database::DatabaseError;

#[derive(Debug, FromRow)]
struct ColumnPermissionRow {
    relation: String,
    associated_column: String,
    relation_role: String,
    access_permission: String,
}

/// Serialized form of the table: one list of columns per relation.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PermissionFile {
    pub relations: BTreeMap<String, Vec<ColumnEntry>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub column: String,
    #[serde(flatten)]
    pub permissions: ColumnPermissions,
}

impl From<&PermissionTable> for PermissionFile {
    fn from(table: &PermissionTable) -> Self {
        let mut file = PermissionFile::default();
        for relation in table.relation_names() {
            let Ok(permissions) = table.relation(relation) else { continue };
            let entries = permissions
                .columns
                .iter()
                .map(|(column, permissions)| ColumnEntry {
                    column: column.clone(),
                    permissions: *permissions,
                })
                .collect();
            file.relations.insert(relation.to_string(), entries);
        }
        file
    }
}

impl From<PermissionFile> for PermissionTable {
    fn from(file: PermissionFile) -> Self {
        let mut table = PermissionTable::new();
        for (relation, entries) in file.relations {
            for entry in entries {
                table.insert_column(&relation, &entry.column, entry.permissions);
            }
        }
        table
    }
}

pub fn to_yaml(table: &PermissionTable) -> Result<String, PermissionError> {
    serde_yaml::to_string(&PermissionFile::from(table)).map_err(|e| PermissionError::Source(e.to_string()))
}

pub fn from_yaml(contents: &str) -> Result<PermissionTable, PermissionError> {
    let file: PermissionFile = serde_yaml::from_str(contents).map_err(|e| PermissionError::Source(e.to_string()))?;
    Ok(file.into())
}

pub fn load_file(path: impl AsRef<Path>) -> Result<PermissionTable, PermissionError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| PermissionError::Source(format!("{}: {}", path.display(), e)))?;
    from_yaml(&contents)
}

/// Build the table from the database mirror. Each row is one
/// (relation, column, role, access level) entry.
pub async fn load_from_database(pool: &PgPool) -> Result<PermissionTable, PermissionError> {
    let rows = sqlx::query_as::<_, ColumnPermissionRow>(
        r#"
        SELECT rc.relation,
               rc.associated_column,
               cp.relation_role::text AS relation_role,
               cp.access_permission::text AS access_permission
        FROM column_permission cp
        JOIN relation_column rc ON rc.id = cp.rc_id
        ORDER BY rc.relation, rc.id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| PermissionError::Source(DatabaseError::from(e).to_string()))?;

    let mut table = PermissionTable::new();
    for row in rows {
        let role: RelationRole = row.relation_role.parse()?;
        let level: AccessLevel = row.access_permission.parse()?;
        table.insert(&row.relation, &row.associated_column, role, level);
    }
    Ok(table)
}

/// Load and validate the table for `source`.
pub async fn load(source: &PermissionSource, pool: &PgPool) -> Result<PermissionTable, PermissionError> {
    let table = match source {
        PermissionSource::Static => PermissionTable::builtin(),
        PermissionSource::Database => load_from_database(pool).await?,
        PermissionSource::File(path) => load_file(path)?,
    };

    let report = table.validate()?;
    for missing in &report.missing {
        tracing::warn!("No column permission entry for {}, treating as NONE", missing);
    }
    tracing::info!("Loaded column permissions from {:?}", source);
    Ok(table)
}
