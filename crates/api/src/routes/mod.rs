//! Route handler modules.

pub mod auth;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod users;

use store::Page;

use crate::error::ApiError;

/// Builds a pagination window from query parameters, enforcing the
/// boundary bounds (`skip >= 0`, `limit` in `1..=100`).
pub(crate) fn page_from(skip: Option<i64>, limit: Option<i64>) -> Result<Page, ApiError> {
    let skip = skip.unwrap_or(0);
    let limit = limit.unwrap_or(Page::DEFAULT_LIMIT);
    if skip < 0 {
        return Err(ApiError::BadRequest("skip must be >= 0".to_string()));
    }
    if !(1..=Page::MAX_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            Page::MAX_LIMIT
        )));
    }
    Ok(Page::new(skip, limit))
}
