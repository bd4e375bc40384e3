use serde::{Deserialize, Serialize};

pub const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

pub fn default_page() -> u64 { 1 }
pub fn default_per_page() -> u64 { 20 }

impl PaginationParams {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// Rows to skip. Pages past `i64::MAX` rows pin to it and yield an empty page.
    pub fn offset(&self) -> i64 {
        let skipped = (self.page.max(1) - 1).saturating_mul(self.limit());
        i64::try_from(skipped).unwrap_or(i64::MAX)
    }

    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: default_page(), per_page: default_per_page() }
    }
}

/// Page of results plus the totals a client needs to render pagination.
#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        let per_page = params.limit();
        Self {
            items,
            total,
            page: params.page.max(1),
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_uses_clamped_limit() {
        assert_eq!(PaginationParams::new(1, 20).offset(), 0);
        assert_eq!(PaginationParams::new(3, 20).offset(), 40);
        assert_eq!(PaginationParams::new(2, 500).offset(), 100);
        assert_eq!(PaginationParams::new(0, 10).offset(), 0);
    }

    #[test]
    fn huge_page_never_yields_a_negative_offset() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page":18446744073709551615,"per_page":20}"#).unwrap();
        assert_eq!(params.offset(), i64::MAX);
        assert_eq!(PaginationParams::new(u64::MAX / 2, 100).offset(), i64::MAX);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PaginationParams::new(1, 10);
        assert_eq!(Paginated::new(Vec::<u8>::new(), 0, &params).total_pages, 0);
        assert_eq!(Paginated::new(vec![1u8], 10, &params).total_pages, 1);
        assert_eq!(Paginated::new(vec![1u8], 11, &params).total_pages, 2);
    }

    #[test]
    fn defaults_apply_when_query_is_empty() {
        let params: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit(), 20);
    }
}
