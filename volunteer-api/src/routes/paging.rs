/// Shared `skip`/`limit` handling for list endpoints

use crate::error::{ApiError, ApiResult};

/// Page size when `limit` is omitted
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page a caller can ask for; bigger limits are clamped
pub const MAX_PAGE_SIZE: i64 = 100;

/// Resolves optional query values into `(offset, limit)`
///
/// # Errors
///
/// - `400 Bad Request`: negative `skip` or `limit` below 1
pub fn resolve(skip: Option<i64>, limit: Option<i64>) -> ApiResult<(i64, i64)> {
    let offset = skip.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

    if offset < 0 {
        return Err(ApiError::BadRequest("Skip cannot be negative".to_string()));
    }
    if limit < 1 {
        return Err(ApiError::BadRequest("Limit must be at least 1".to_string()));
    }

    Ok((offset, limit.min(MAX_PAGE_SIZE)))
}
