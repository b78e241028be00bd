use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::config::ResourceConfig;
use super::write::insert_entry;
use super::{resolve_role, CrudContext};
use crate::database::relations::RelationDescriptor;
use crate::error::ApiError;
use crate::permissions::check_has_permission_to_edit_columns;

/// Separator inside a cell bound for a list column.
const LIST_SEPARATOR: char = ';';

/// Convert one CSV record into entry data. Empty cells become NULL.
fn record_to_entry(
    relation: &RelationDescriptor,
    headers: &[String],
    record: &csv::StringRecord,
) -> Result<Map<String, Value>, ApiError> {
    let mut entry = Map::new();
    for (header, cell) in headers.iter().zip(record.iter()) {
        let column = relation.require_column(header)?;
        let value = if cell.is_empty() {
            Value::Null
        } else if column.is_array() {
            Value::Array(
                cell.split(LIST_SEPARATOR)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect(),
            )
        } else {
            Value::String(cell.to_string())
        };
        entry.insert(header.clone(), value);
    }
    Ok(entry)
}

/// Insert every data row of a CSV document. Each row runs in its own
/// savepoint so a failing row does not abort the rest.
pub async fn bulk_insert(ctx: &CrudContext<'_>, resource: &ResourceConfig, csv_body: &str) -> Result<Value, ApiError> {
    let relation = resource.descriptor()?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_body.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ApiError::bad_request("CSV header row is missing"));
    }

    let mut tx = ctx.db.begin().await?;
    let role = resolve_role(ctx, &mut tx, relation, None).await?;
    check_has_permission_to_edit_columns(ctx.permissions, relation.name, role, &headers)?;

    let mut ids = Vec::new();
    let mut errors: HashMap<String, String> = HashMap::new();

    for (index, record) in reader.records().enumerate() {
        let row_number = (index + 1).to_string();
        let entry = match record.map_err(ApiError::from).and_then(|r| record_to_entry(relation, &headers, &r)) {
            Ok(entry) => entry,
            Err(e) => {
                errors.insert(row_number, e.message().to_string());
                continue;
            }
        };

        let mut savepoint = sqlx::Connection::begin(&mut *tx).await?;
        match insert_entry(ctx, &mut savepoint, resource, relation, role, entry).await {
            Ok(id) => {
                savepoint.commit().await?;
                ids.push(id);
            }
            Err(e) => {
                savepoint.rollback().await?;
                tracing::debug!(relation = relation.name, row = %row_number, "bulk row rejected: {}", e);
                errors.insert(row_number, e.message().to_string());
            }
        }
    }

    if ids.is_empty() {
        if errors.is_empty() {
            return Err(ApiError::bad_request("CSV contains no data rows"));
        }
        return Err(ApiError::validation_error("No rows were imported", Some(errors)));
    }
    tx.commit().await?;

    tracing::info!(relation = relation.name, created = ids.len(), failed = errors.len(), "bulk import");
    Ok(json!({
        "message": format!("{} {} created", ids.len(), resource.plural_name.to_lowercase()),
        "ids": ids,
        "errors": errors
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::relations::DATA_SOURCES;

    fn parse(body: &str) -> (Vec<String>, Vec<csv::StringRecord>) {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(body.as_bytes());
        let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
        let records = reader.records().map(|r| r.unwrap()).collect();
        (headers, records)
    }

    #[test]
    fn cells_map_to_typed_json() {
        let (headers, records) = parse("name,record_formats,description\nPolice logs, CSV ; PDF ,\n");
        let entry = record_to_entry(&DATA_SOURCES, &headers, &records[0]).unwrap();
        assert_eq!(entry["name"], json!("Police logs"));
        assert_eq!(entry["record_formats"], json!(["CSV", "PDF"]));
        assert_eq!(entry["description"], Value::Null);
    }

    #[test]
    fn unknown_header_is_rejected() {
        let (headers, records) = parse("name,bogus\na,b\n");
        assert_eq!(record_to_entry(&DATA_SOURCES, &headers, &records[0]).unwrap_err().status_code(), 400);
    }
}
