use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::OrderStatus;
pub use crate::models::SortOrder;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Listing filter and paging, shared by the RPC and REST surfaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<OrderStatus>,
    pub sort_order: Option<SortOrder>,
}

impl OrderPaginationQuery {
    /// Returns `(page, limit, offset)`.
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(limit);
        (page, limit, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten() {
        assert_eq!(OrderPaginationQuery::default().normalize(), (1, 10, 0));
    }

    #[test]
    fn clamps_out_of_range_values() {
        let query = OrderPaginationQuery {
            page: Some(0),
            limit: Some(1_000),
            ..Default::default()
        };
        assert_eq!(query.normalize(), (1, MAX_PAGE_SIZE, 0));
    }

    #[test]
    fn offset_skips_previous_pages() {
        let query = OrderPaginationQuery {
            page: Some(3),
            limit: Some(10),
            ..Default::default()
        };
        assert_eq!(query.normalize(), (3, 10, 20));
    }

    #[test]
    fn huge_page_saturates_offset() {
        let query = OrderPaginationQuery {
            page: Some(i64::MAX),
            limit: Some(50),
            ..Default::default()
        };
        assert_eq!(query.normalize(), (i64::MAX, 50, i64::MAX));
    }
}
