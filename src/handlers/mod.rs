//! HTTP handlers for the admin surface.

use serde::{Deserialize, Serialize};

pub mod currencies;
pub mod discounts;
pub mod pricing;
pub mod products;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListParams {
    /// Clamped (page, per_page, offset) for a LIMIT/OFFSET query.
    pub fn window(&self) -> (u32, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).min(100);
        (page, per_page as i64, ((page - 1) * per_page) as i64)
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}
