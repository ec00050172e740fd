//! Pagination bounds shared by list operations.

use crate::defaults::{PAGE_LIMIT, PAGE_LIMIT_MAX, PAGE_OFFSET};

/// Clamp caller-supplied pagination to sane bounds.
///
/// A missing limit becomes [`PAGE_LIMIT`]; limits are held to
/// `1..=PAGE_LIMIT_MAX` and negative offsets become zero.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(PAGE_LIMIT).clamp(1, PAGE_LIMIT_MAX);
    let offset = offset.unwrap_or(PAGE_OFFSET).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(None, None), (PAGE_LIMIT, 0));
        assert_eq!(page_bounds(Some(0), Some(-5)), (1, 0));
        assert_eq!(page_bounds(Some(10_000), Some(40)), (PAGE_LIMIT_MAX, 40));
    }
}
