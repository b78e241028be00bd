use serde_json::{Map, Value};

use super::error::QueryError;
use super::types::SqlResult;
use super::{quote_identifier, Params};
use crate::database::relations::{ColumnDescriptor, NestedRelation, RelationDescriptor};

fn resolve_values(
    relation: &RelationDescriptor,
    values: &Map<String, Value>,
) -> Result<Vec<(&'static ColumnDescriptor, Value)>, QueryError> {
    if values.is_empty() {
        return Err(QueryError::NoValues(relation.name.to_string()));
    }
    values
        .iter()
        .map(|(name, value)| Ok((relation.require_column(name)?, value.clone())))
        .collect()
}

/// `INSERT ... RETURNING id` for one row.
pub struct InsertQuery {
    relation: &'static RelationDescriptor,
    values: Vec<(&'static ColumnDescriptor, Value)>,
}

impl InsertQuery {
    pub fn new(relation: &'static RelationDescriptor, values: &Map<String, Value>) -> Result<Self, QueryError> {
        Ok(Self {
            relation,
            values: resolve_values(relation, values)?,
        })
    }

    pub fn to_sql(&self) -> Result<SqlResult, QueryError> {
        let mut params = Params::new();
        let mut columns = Vec::with_capacity(self.values.len());
        let mut placeholders = Vec::with_capacity(self.values.len());
        for (column, value) in &self.values {
            columns.push(quote_identifier(column.name)?);
            placeholders.push(params.push_typed(column, value.clone())?);
        }

        let id = quote_identifier(self.relation.id_column)?;
        let query = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING CAST({} AS bigint) AS {}",
            quote_identifier(self.relation.name)?,
            columns.join(", "),
            placeholders.join(", "),
            id,
            id
        );
        Ok(SqlResult {
            query,
            params: params.into_values(),
        })
    }
}

/// `UPDATE ... WHERE id = $n` for one row.
pub struct UpdateQuery {
    relation: &'static RelationDescriptor,
    id: i64,
    values: Vec<(&'static ColumnDescriptor, Value)>,
}

impl UpdateQuery {
    pub fn new(relation: &'static RelationDescriptor, id: i64, values: &Map<String, Value>) -> Result<Self, QueryError> {
        Ok(Self {
            relation,
            id,
            values: resolve_values(relation, values)?,
        })
    }

    pub fn to_sql(&self) -> Result<SqlResult, QueryError> {
        let mut params = Params::new();
        let mut assignments = Vec::with_capacity(self.values.len());
        for (column, value) in &self.values {
            assignments.push(format!("{} = {}", quote_identifier(column.name)?, params.push_typed(column, value.clone())?));
        }
        let query = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            quote_identifier(self.relation.name)?,
            assignments.join(", "),
            quote_identifier(self.relation.id_column)?,
            params.push(Value::from(self.id))
        );
        Ok(SqlResult {
            query,
            params: params.into_values(),
        })
    }
}

/// `DELETE ... WHERE id = $1`
pub struct DeleteQuery {
    relation: &'static RelationDescriptor,
    id: i64,
}

impl DeleteQuery {
    pub fn new(relation: &'static RelationDescriptor, id: i64) -> Self {
        Self { relation, id }
    }

    pub fn to_sql(&self) -> Result<SqlResult, QueryError> {
        Ok(SqlResult {
            query: format!(
                "DELETE FROM {} WHERE {} = $1",
                quote_identifier(self.relation.name)?,
                quote_identifier(self.relation.id_column)?
            ),
            params: vec![Value::from(self.id)],
        })
    }
}

/// `SELECT EXISTS(...)` matching both the id and the owner column.
pub struct ExistsQuery {
    relation: &'static RelationDescriptor,
    owner_column: &'static str,
    id: i64,
    user_id: i64,
}

impl ExistsQuery {
    /// Returns `None` when the relation has no owner column.
    pub fn owned_by(relation: &'static RelationDescriptor, id: i64, user_id: i64) -> Option<Self> {
        relation.owner_column.map(|owner_column| Self {
            relation,
            owner_column,
            id,
            user_id,
        })
    }

    pub fn to_sql(&self) -> Result<SqlResult, QueryError> {
        let mut params = Params::new();
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = {} AND {} = {}) AS \"exists\"",
            quote_identifier(self.relation.name)?,
            quote_identifier(self.relation.id_column)?,
            params.push(Value::from(self.id)),
            quote_identifier(self.owner_column)?,
            params.push(Value::from(self.user_id))
        );
        Ok(SqlResult {
            query,
            params: params.into_values(),
        })
    }
}

/// One row in a link table joining a parent to a nested target.
pub struct LinkInsertQuery {
    link: &'static NestedRelation,
    parent_id: i64,
    target_id: i64,
}

impl LinkInsertQuery {
    pub fn new(link: &'static NestedRelation, parent_id: i64, target_id: i64) -> Self {
        Self {
            link,
            parent_id,
            target_id,
        }
    }

    pub fn to_sql(&self) -> Result<SqlResult, QueryError> {
        Ok(SqlResult {
            query: format!(
                "INSERT INTO {} ({}, {}) VALUES ($1, $2)",
                quote_identifier(self.link.link_table)?,
                quote_identifier(self.link.link_parent_column)?,
                quote_identifier(self.link.link_target_column)?
            ),
            params: vec![Value::from(self.parent_id), Value::from(self.target_id)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::relations::{AGENCIES, DATA_REQUESTS, DATA_SOURCES};
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn insert_casts_values_and_returns_id() {
        let values = map(json!({"name": "Records", "access_types": ["web page", "api"]}));
        let sql = InsertQuery::new(&DATA_SOURCES, &values).unwrap().to_sql().unwrap();
        assert_eq!(
            sql.query,
            "INSERT INTO \"data_sources\" (\"access_types\", \"name\") VALUES ($1::access_type[], $2::text) \
             RETURNING CAST(\"id\" AS bigint) AS \"id\""
        );
        assert_eq!(sql.params, vec![json!(["web page", "api"]), json!("Records")]);
    }

    #[test]
    fn insert_requires_values_and_known_columns() {
        assert!(matches!(InsertQuery::new(&AGENCIES, &Map::new()), Err(QueryError::NoValues(_))));
        let values = map(json!({"name); DROP TABLE agencies; --": "x"}));
        assert!(matches!(InsertQuery::new(&AGENCIES, &values), Err(QueryError::UnknownColumn { .. })));
    }

    #[test]
    fn update_binds_id_last() {
        let values = map(json!({"name": "New"}));
        let sql = UpdateQuery::new(&AGENCIES, 12, &values).unwrap().to_sql().unwrap();
        assert_eq!(sql.query, "UPDATE \"agencies\" SET \"name\" = $1::text WHERE \"id\" = $2");
        assert_eq!(sql.params, vec![json!("New"), json!(12)]);
    }

    #[test]
    fn delete_by_id() {
        let sql = DeleteQuery::new(&AGENCIES, 3).to_sql().unwrap();
        assert_eq!(sql.query, "DELETE FROM \"agencies\" WHERE \"id\" = $1");
        assert_eq!(sql.params, vec![json!(3)]);
    }

    #[test]
    fn ownership_exists_query() {
        let sql = ExistsQuery::owned_by(&DATA_REQUESTS, 5, 9).unwrap().to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT EXISTS(SELECT 1 FROM \"data_requests\" WHERE \"id\" = $1 AND \"creator_user_id\" = $2) AS \"exists\""
        );
        assert_eq!(sql.params, vec![json!(5), json!(9)]);

        assert!(ExistsQuery::owned_by(&AGENCIES, 5, 9).is_none());
    }

    #[test]
    fn link_insert() {
        let link = DATA_SOURCES.nested("agencies").unwrap();
        let sql = LinkInsertQuery::new(link, 4, 8).to_sql().unwrap();
        assert_eq!(
            sql.query,
            "INSERT INTO \"link_agencies_data_sources\" (\"data_source_id\", \"agency_id\") VALUES ($1, $2)"
        );
        assert_eq!(sql.params, vec![json!(4), json!(8)]);
    }
}
