use super::error::QueryError;
use super::qualified;
use super::types::{OrderInfo, SortDirection};
use crate::database::relations::RelationDescriptor;

pub struct OrderClause;

impl OrderClause {
    pub fn generate(relation: &RelationDescriptor, infos: &[OrderInfo]) -> Result<String, QueryError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(infos.len());
        for info in infos {
            let column = relation.require_column(&info.column)?;
            parts.push(format!("{} {}", qualified(relation.name, column.name)?, info.sort.to_sql()));
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}
