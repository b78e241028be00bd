use serde_json::Value;

use super::error::QueryError;
use super::types::{Condition, ConditionOp};
use super::{qualified, Params};
use crate::database::relations::RelationDescriptor;

pub struct WhereClause;

impl WhereClause {
    /// Render `conditions` joined with AND, or an empty string when there
    /// are none. Values are appended to `params`.
    pub fn generate(
        relation: &RelationDescriptor,
        conditions: &[Condition],
        params: &mut Params,
    ) -> Result<String, QueryError> {
        let mut parts = Vec::with_capacity(conditions.len());
        for condition in conditions {
            parts.push(Self::build_condition(relation, condition, params)?);
        }
        Ok(parts.join(" AND "))
    }

    fn build_condition(
        relation: &RelationDescriptor,
        condition: &Condition,
        params: &mut Params,
    ) -> Result<String, QueryError> {
        let column = relation.require_column(&condition.column)?;
        let quoted_column = qualified(relation.name, column.name)?;

        match condition.operator {
            ConditionOp::Eq => {
                if condition.value.is_null() {
                    Ok(format!("{} IS NULL", quoted_column))
                } else {
                    Ok(format!("{} = {}", quoted_column, params.push_typed(column, condition.value.clone())?))
                }
            }
            ConditionOp::Neq => {
                if condition.value.is_null() {
                    Ok(format!("{} IS NOT NULL", quoted_column))
                } else {
                    Ok(format!("{} <> {}", quoted_column, params.push_typed(column, condition.value.clone())?))
                }
            }
            ConditionOp::ILike => {
                let Value::String(pattern) = &condition.value else {
                    return Err(QueryError::InvalidValue {
                        column: column.name.to_string(),
                        reason: "pattern must be a string".to_string(),
                    });
                };
                Ok(format!("{}::text ILIKE {}", quoted_column, params.push(Value::String(pattern.clone()))))
            }
            ConditionOp::In => {
                if let Value::Array(values) = &condition.value {
                    if values.is_empty() {
                        return Ok("1=0".to_string());
                    }
                    let mut placeholders = Vec::with_capacity(values.len());
                    for value in values {
                        placeholders.push(params.push_typed(column, value.clone())?);
                    }
                    Ok(format!("{} IN ({})", quoted_column, placeholders.join(", ")))
                } else {
                    Ok(format!("{} = {}", quoted_column, params.push_typed(column, condition.value.clone())?))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::relations::DATA_SOURCES;
    use serde_json::json;

    fn condition(column: &str, operator: ConditionOp, value: Value) -> Condition {
        Condition {
            column: column.to_string(),
            operator,
            value,
        }
    }

    #[test]
    fn empty_conditions_render_nothing() {
        let mut params = Params::new();
        assert_eq!(WhereClause::generate(&DATA_SOURCES, &[], &mut params).unwrap(), "");
        assert!(params.into_values().is_empty());
    }

    #[test]
    fn values_are_bound_and_cast() {
        let mut params = Params::new();
        let sql = WhereClause::generate(
            &DATA_SOURCES,
            &[
                condition("approval_status", ConditionOp::Eq, json!("approved")),
                condition("name", ConditionOp::ILike, json!("%police%")),
                condition("url_status", ConditionOp::Neq, Value::Null),
            ],
            &mut params,
        )
        .unwrap();

        assert_eq!(
            sql,
            "\"data_sources\".\"approval_status\" = $1::approval_status AND \
             \"data_sources\".\"name\"::text ILIKE $2 AND \
             \"data_sources\".\"url_status\" IS NOT NULL"
        );
        assert_eq!(params.into_values(), vec![json!("approved"), json!("%police%")]);
    }

    #[test]
    fn in_expands_one_param_per_value() {
        let mut params = Params::new();
        let sql =
            WhereClause::generate(&DATA_SOURCES, &[condition("id", ConditionOp::In, json!([1, 2, 3]))], &mut params)
                .unwrap();
        assert_eq!(sql, "\"data_sources\".\"id\" IN ($1::integer, $2::integer, $3::integer)");

        let mut params = Params::new();
        let sql = WhereClause::generate(&DATA_SOURCES, &[condition("id", ConditionOp::In, json!([]))], &mut params)
            .unwrap();
        assert_eq!(sql, "1=0");
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let mut params = Params::new();
        let result = WhereClause::generate(
            &DATA_SOURCES,
            &[condition("1=1 OR name", ConditionOp::Eq, json!("x"))],
            &mut params,
        );
        assert!(matches!(result, Err(QueryError::UnknownColumn { .. })));
    }
}
