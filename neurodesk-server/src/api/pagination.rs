//! Pagination envelope for list endpoints

use serde::Serialize;

/// Upper bound for `limit` query parameters
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Pagination metadata returned alongside list results
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        let has_next_page = page < total_pages;
        let has_prev_page = page > 1;
        Self {
            total,
            page,
            limit,
            total_pages,
            has_next_page,
            has_prev_page,
            next_page: has_next_page.then_some(page + 1),
            prev_page: has_prev_page.then_some(page - 1),
        }
    }
}

/// Clamp page/limit query values to sane bounds
pub fn page_params(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).clamp(1, i64::MAX / MAX_PAGE_SIZE);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_metadata() {
        let p = Pagination::new(25, 2, 10);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(p.has_prev_page);
        assert_eq!(p.next_page, Some(3));
        assert_eq!(p.prev_page, Some(1));

        let p = Pagination::new(0, 1, 10);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next_page);
        assert!(!p.has_prev_page);
    }

    #[test]
    fn page_params_clamped() {
        assert_eq!(page_params(None, None), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(page_params(Some(0), Some(1000)), (1, MAX_PAGE_SIZE));
        assert_eq!(page_params(Some(3), Some(25)), (3, 25));
    }
}
