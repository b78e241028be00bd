use std::collections::HashMap;

use super::config::ResourceConfig;
use crate::error::ApiError;
use crate::query::SortDirection;

/// Query-string options of a list request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub page: i64,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: SortDirection,
    pub requested_columns: Option<Vec<String>>,
    /// Equality filters, in column order.
    pub filters: Vec<(String, String)>,
}

impl ListParams {
    /// Parse raw query pairs. Keys other than the paging options must be
    /// one of the resource's filterable columns.
    pub fn from_query(resource: &ResourceConfig, query: &HashMap<String, String>) -> Result<Self, ApiError> {
        let mut params = ListParams {
            page: 1,
            ..Default::default()
        };

        for (key, value) in query {
            match key.as_str() {
                "page" => params.page = parse_int(key, value)?,
                "limit" => params.limit = Some(parse_int(key, value)?),
                "sort_by" => params.sort_by = Some(value.trim().to_string()).filter(|s| !s.is_empty()),
                "sort_order" => params.sort_order = SortDirection::parse(value.trim())?,
                "requested_columns" => {
                    let columns: Vec<String> = value
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string)
                        .collect();
                    if !columns.is_empty() {
                        params.requested_columns = Some(columns);
                    }
                }
                column if resource.filterable.contains(&column) => {
                    params.filters.push((column.to_string(), value.clone()));
                }
                other => {
                    return Err(ApiError::bad_request(format!("Unknown query parameter: {}", other)));
                }
            }
        }

        params.filters.sort();
        Ok(params)
    }
}

fn parse_int(key: &str, value: &str) -> Result<i64, ApiError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("'{}' must be an integer", key)))
}
