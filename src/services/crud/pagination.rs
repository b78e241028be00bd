use crate::query::QueryError;

pub const PAGE_SIZE: i64 = 100;

/// Offset of `page` (1-based) at the default page size.
pub fn get_offset(page: i64) -> Result<i64, QueryError> {
    page_offset(page, PAGE_SIZE)
}

pub fn page_offset(page: i64, page_size: i64) -> Result<i64, QueryError> {
    if page < 1 {
        return Err(QueryError::InvalidOffset(format!("page must be at least 1, got {}", page)));
    }
    (page - 1)
        .checked_mul(page_size)
        .ok_or_else(|| QueryError::InvalidOffset(format!("page {} is out of range", page)))
}

/// Effective row limit: `requested` or `default`, capped at `max_limit`.
pub fn resolve_limit(requested: Option<i64>, default: i64, max_limit: i64) -> Result<i64, QueryError> {
    let limit = requested.unwrap_or(default);
    if limit < 1 {
        return Err(QueryError::InvalidLimit(format!("limit must be at least 1, got {}", limit)));
    }
    if limit > max_limit {
        tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
        return Ok(max_limit);
    }
    Ok(limit)
}
