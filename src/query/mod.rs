//! Parameterized SQL construction over the static relation descriptors.
//!
//! Identifiers are checked against the descriptors and quoted; every
//! literal becomes a bound parameter.

pub mod error;
pub mod mutation;
pub mod order;
pub mod select;
pub mod types;
pub mod where_clause;

pub use error::QueryError;
pub use mutation::{DeleteQuery, ExistsQuery, InsertQuery, LinkInsertQuery, UpdateQuery};
pub use select::SelectQuery;
pub use types::{Condition, ConditionOp, OrderInfo, SortDirection, SqlResult};

use serde_json::Value;

use crate::database::relations::ColumnDescriptor;

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn quote_identifier(name: &str) -> Result<String, QueryError> {
    if !is_valid_identifier(name) {
        return Err(QueryError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name))
}

/// `"table"."column"`
pub(crate) fn qualified(table: &str, column: &str) -> Result<String, QueryError> {
    Ok(format!("{}.{}", quote_identifier(table)?, quote_identifier(column)?))
}

/// Identifier rendered as a string literal, for `json_build_object` keys.
pub(crate) fn key_literal(name: &str) -> Result<String, QueryError> {
    if !is_valid_identifier(name) {
        return Err(QueryError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("'{}'", name))
}

/// Bound parameter list shared by every clause of one statement.
#[derive(Debug, Default)]
pub(crate) struct Params {
    values: Vec<Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` and return its placeholder.
    pub fn push(&mut self, value: Value) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    /// Bind `value` and return its placeholder cast to the column's type.
    pub fn push_typed(&mut self, column: &ColumnDescriptor, value: Value) -> Result<String, QueryError> {
        check_value_shape(column, &value)?;
        let placeholder = self.push(value);
        Ok(format!("{}::{}", placeholder, column.sql_type))
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Reject values whose JSON shape can never fit the column.
fn check_value_shape(column: &ColumnDescriptor, value: &Value) -> Result<(), QueryError> {
    let invalid = |reason: &str| QueryError::InvalidValue {
        column: column.name.to_string(),
        reason: reason.to_string(),
    };

    match value {
        Value::Null => Ok(()),
        Value::Array(items) => {
            if !column.is_array() {
                return Err(invalid("lists are only accepted for list columns"));
            }
            if items.iter().any(|v| v.is_array() || v.is_object()) {
                return Err(invalid("list items must be scalar values"));
            }
            Ok(())
        }
        Value::Object(_) => {
            if column.sql_type == "jsonb" || column.sql_type == "json" {
                Ok(())
            } else {
                Err(invalid("objects are only accepted for JSON columns"))
            }
        }
        _ if column.is_array() => Err(invalid("expected a list")),
        Value::Number(_) => match column.sql_type {
            "integer" | "bigint" | "double precision" | "text" => Ok(()),
            _ => Err(invalid("numbers are not accepted for this column")),
        },
        Value::Bool(_) => match column.sql_type {
            "boolean" | "text" => Ok(()),
            _ => Err(invalid("true/false is not accepted for this column")),
        },
        Value::String(_) => Ok(()),
    }
}
