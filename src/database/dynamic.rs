//! Executes statements produced by the query constructor.
//!
//! Every function takes a plain `&mut PgConnection` so the same code runs
//! on a pooled connection or inside a transaction.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::{PgConnection, Postgres, Row};
use std::time::Instant;

use super::client::DatabaseError;
use super::relations::RelationDescriptor;
use crate::permissions::OwnershipLookup;
use crate::query::{ExistsQuery, QueryError, SqlResult};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

fn build_query(sql: &SqlResult) -> PgQuery<'_> {
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param(q, p);
    }
    q
}

pub(crate) fn bind_param<'q>(q: PgQuery<'q>, v: &'q Value) -> PgQuery<'q> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // Bound as text[]; the placeholder cast converts to the column's array type.
        Value::Array(items) => {
            let texts: Vec<Option<String>> = items
                .iter()
                .map(|item| match item {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            q.bind(texts)
        }
        Value::Object(_) => q.bind(v.clone()),
    }
}

fn log_query(sql: &SqlResult, started: Instant) {
    let config = &crate::config::config().database;
    let elapsed = started.elapsed();
    if config.enable_query_logging {
        tracing::debug!(query = %sql.query, params = sql.params.len(), elapsed_ms = elapsed.as_millis() as u64, "sql");
    }
    if elapsed.as_millis() as u64 > config.slow_query_threshold_ms {
        tracing::warn!(query = %sql.query, elapsed_ms = elapsed.as_millis() as u64, "slow query");
    }
}

/// Run a SELECT whose single column `row` holds a JSON object.
pub async fn fetch_rows(conn: &mut PgConnection, sql: &SqlResult) -> Result<Vec<Value>, DatabaseError> {
    let started = Instant::now();
    let rows = build_query(sql).fetch_all(&mut *conn).await?;
    log_query(sql, started);

    rows.iter()
        .map(|row| row.try_get::<Value, _>("row").map_err(DatabaseError::from))
        .collect()
}

pub async fn fetch_optional_row(conn: &mut PgConnection, sql: &SqlResult) -> Result<Option<Value>, DatabaseError> {
    let started = Instant::now();
    let row = build_query(sql).fetch_optional(&mut *conn).await?;
    log_query(sql, started);

    match row {
        Some(row) => Ok(Some(row.try_get::<Value, _>("row")?)),
        None => Ok(None),
    }
}

/// Run an INSERT with `RETURNING ... AS id`.
pub async fn insert_returning_id(conn: &mut PgConnection, sql: &SqlResult) -> Result<i64, DatabaseError> {
    let started = Instant::now();
    let row = build_query(sql).fetch_one(&mut *conn).await?;
    log_query(sql, started);
    Ok(row.try_get::<i64, _>("id")?)
}

/// Run a statement and return the number of affected rows.
pub async fn execute(conn: &mut PgConnection, sql: &SqlResult) -> Result<u64, DatabaseError> {
    let started = Instant::now();
    let result = build_query(sql).execute(&mut *conn).await?;
    log_query(sql, started);
    Ok(result.rows_affected())
}

/// Run a `SELECT EXISTS(...) AS exists`.
pub async fn fetch_exists(conn: &mut PgConnection, sql: &SqlResult) -> Result<bool, DatabaseError> {
    let started = Instant::now();
    let row = build_query(sql).fetch_one(&mut *conn).await?;
    log_query(sql, started);
    Ok(row.try_get::<bool, _>("exists")?)
}

pub(crate) fn query_error(err: QueryError) -> DatabaseError {
    DatabaseError::QueryError(err.to_string())
}

/// Ownership checks against the owner column of one relation.
pub struct RelationOwnership<'c> {
    conn: &'c mut PgConnection,
    relation: &'static RelationDescriptor,
}

impl<'c> RelationOwnership<'c> {
    pub fn new(conn: &'c mut PgConnection, relation: &'static RelationDescriptor) -> Self {
        Self { conn, relation }
    }
}

#[async_trait]
impl OwnershipLookup for RelationOwnership<'_> {
    async fn is_owner(&mut self, user_id: i64, resource_id: i64) -> Result<bool, DatabaseError> {
        let Some(query) = ExistsQuery::owned_by(self.relation, resource_id, user_id) else {
            return Ok(false);
        };
        let sql = query.to_sql().map_err(query_error)?;
        fetch_exists(self.conn, &sql).await
    }
}
