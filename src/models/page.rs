use serde::Serialize;

/// Paged list: total matching rows plus the current window.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub items: Vec<T>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamps client paging input to `1..=MAX_PAGE_SIZE` and a non-negative offset.
pub fn page_window(limit: Option<i64>, offset: Option<i64>, default_limit: i64) -> (i64, i64) {
    let limit = limit
        .filter(|l| *l > 0)
        .unwrap_or(default_limit)
        .min(MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}
