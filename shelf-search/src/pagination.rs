//! Pagination metadata for offset/limit paging

use serde::Serialize;

/// Page metadata computed from limit, offset, and the total record count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetadata {
    pub limit: u32,
    pub offset: u64,
    pub total_records: u64,
    pub total_pages: u64,
    /// 1-indexed page containing `offset`
    pub current_page: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMetadata {
    /// Calculate page metadata
    ///
    /// `limit` must be at least 1 (enforced by request validation); a zero
    /// limit yields [`PaginationMetadata::zeroed`] instead of dividing by zero.
    ///
    /// # Examples
    /// ```
    /// use shelf_search::pagination::PaginationMetadata;
    ///
    /// // 25 records, 10 per page, starting at record 10 = page 2 of 3
    /// let p = PaginationMetadata::build(10, 10, 25);
    /// assert_eq!(p.total_pages, 3);
    /// assert_eq!(p.current_page, 2);
    /// assert!(p.has_next_page);
    /// assert!(p.has_previous_page);
    /// ```
    pub fn build(limit: u32, offset: u64, total_records: u64) -> Self {
        if limit == 0 {
            return Self::zeroed();
        }

        let page_size = u64::from(limit);
        Self {
            limit,
            offset,
            total_records,
            total_pages: total_records.div_ceil(page_size),
            current_page: offset / page_size + 1,
            has_next_page: offset.saturating_add(page_size) < total_records,
            has_previous_page: offset > 0,
        }
    }

    /// All-zero metadata for responses where no paging parameters are usable
    pub fn zeroed() -> Self {
        Self {
            limit: 0,
            offset: 0,
            total_records: 0,
            total_pages: 0,
            current_page: 0,
            has_next_page: false,
            has_previous_page: false,
        }
    }
}
