use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOp {
    Eq,
    Neq,
    ILike,
    In,
}

#[derive(Debug, Clone)]
pub struct Condition {
    pub column: String,
    pub operator: ConditionOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn parse(value: &str) -> Result<Self, QueryError> {
        if value.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(QueryError::InvalidSortOrder(value.to_string()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// SQL text plus the values bound to `$1..$n`, in order.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
