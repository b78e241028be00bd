use serde_json::Value;

use super::error::QueryError;
use super::order::OrderClause;
use super::types::{Condition, ConditionOp, OrderInfo, SqlResult};
use super::where_clause::WhereClause;
use super::{key_literal, qualified, quote_identifier, Params};
use crate::database::relations::{require_relation, ColumnDescriptor, NestedRelation, RelationDescriptor};

struct NestedSelect {
    link: &'static NestedRelation,
    target: &'static RelationDescriptor,
    columns: Vec<&'static ColumnDescriptor>,
}

/// SELECT over one relation that yields each row as a single JSON object.
///
/// Nested relations are aggregated into JSON arrays through their link
/// table, so one round trip returns the full document.
pub struct SelectQuery {
    relation: &'static RelationDescriptor,
    columns: Vec<&'static ColumnDescriptor>,
    nested: Vec<NestedSelect>,
    conditions: Vec<Condition>,
    order: Vec<OrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectQuery {
    pub fn new(relation: &'static RelationDescriptor) -> Self {
        Self {
            relation,
            columns: vec![],
            nested: vec![],
            conditions: vec![],
            order: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn select<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<&mut Self, QueryError> {
        self.columns = resolve_columns(self.relation, columns)?;
        Ok(self)
    }

    /// Include the nested relation `name` with the given target columns.
    pub fn nest<S: AsRef<str>>(&mut self, name: &str, columns: &[S]) -> Result<&mut Self, QueryError> {
        let link = self.relation.nested(name).ok_or_else(|| QueryError::UnknownColumn {
            relation: self.relation.name.to_string(),
            column: name.to_string(),
        })?;
        let target = require_relation(link.relation)?;
        let columns = resolve_columns(target, columns)?;
        if columns.is_empty() {
            return Ok(self);
        }
        self.nested.push(NestedSelect { link, target, columns });
        Ok(self)
    }

    pub fn filter(&mut self, column: &str, operator: ConditionOp, value: Value) -> Result<&mut Self, QueryError> {
        self.relation.require_column(column)?;
        self.conditions.push(Condition {
            column: column.to_string(),
            operator,
            value,
        });
        Ok(self)
    }

    pub fn where_id(&mut self, id: i64) -> Result<&mut Self, QueryError> {
        self.filter(self.relation.id_column, ConditionOp::Eq, Value::from(id))
    }

    pub fn order(&mut self, order: Vec<OrderInfo>) -> Result<&mut Self, QueryError> {
        for info in &order {
            self.relation.require_column(&info.column)?;
        }
        self.order = order;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, QueryError> {
        if limit < 0 {
            return Err(QueryError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(QueryError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, QueryError> {
        if self.columns.is_empty() && self.nested.is_empty() {
            return Err(QueryError::NoColumns(self.relation.name.to_string()));
        }

        let mut params = Params::new();
        let select_clause = self.build_select_clause()?;
        let where_clause = WhereClause::generate(self.relation, &self.conditions, &mut params)?;
        let order_clause = OrderClause::generate(self.relation, &self.order)?;
        let limit_clause = self.build_limit_clause(&mut params);

        let query = [
            format!("SELECT {} AS \"row\"", select_clause),
            format!("FROM {}", quote_identifier(self.relation.name)?),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult {
            query,
            params: params.into_values(),
        })
    }

    fn build_select_clause(&self) -> Result<String, QueryError> {
        let mut pairs = Vec::with_capacity(self.columns.len() + self.nested.len());
        for column in &self.columns {
            pairs.push(format!("{}, {}", key_literal(column.name)?, qualified(self.relation.name, column.name)?));
        }
        for nested in &self.nested {
            pairs.push(format!("{}, ({})", key_literal(nested.link.name)?, self.build_nested_subquery(nested)?));
        }
        Ok(format!("json_build_object({})", pairs.join(", ")))
    }

    fn build_nested_subquery(&self, nested: &NestedSelect) -> Result<String, QueryError> {
        let target_alias = format!("{}_row", nested.link.name);
        let link_alias = format!("{}_link", nested.link.name);

        let mut pairs = Vec::with_capacity(nested.columns.len());
        for column in &nested.columns {
            pairs.push(format!("{}, {}", key_literal(column.name)?, qualified(&target_alias, column.name)?));
        }

        Ok(format!(
            "SELECT COALESCE(json_agg(json_build_object({})), '[]'::json) \
             FROM {} AS {} JOIN {} AS {} ON {} = {} WHERE {} = {}",
            pairs.join(", "),
            quote_identifier(nested.target.name)?,
            quote_identifier(&target_alias)?,
            quote_identifier(nested.link.link_table)?,
            quote_identifier(&link_alias)?,
            qualified(&link_alias, nested.link.link_target_column)?,
            qualified(&target_alias, nested.target.id_column)?,
            qualified(&link_alias, nested.link.link_parent_column)?,
            qualified(self.relation.name, self.relation.id_column)?,
        ))
    }

    fn build_limit_clause(&self, params: &mut Params) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => {
                let limit = params.push(Value::from(l));
                let offset = params.push(Value::from(o));
                format!("LIMIT {} OFFSET {}", limit, offset)
            }
            (Some(l), None) => format!("LIMIT {}", params.push(Value::from(l))),
            _ => String::new(),
        }
    }
}

fn resolve_columns<S: AsRef<str>>(
    relation: &RelationDescriptor,
    columns: &[S],
) -> Result<Vec<&'static ColumnDescriptor>, QueryError> {
    let mut out: Vec<&'static ColumnDescriptor> = Vec::with_capacity(columns.len());
    for name in columns {
        let column = relation.require_column(name.as_ref())?;
        if !out.iter().any(|c| c.name == column.name) {
            out.push(column);
        }
    }
    Ok(out)
}
