//! Price calculation endpoints backing the cart and order admin screens.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::domain::pricing::Quote;
use crate::error::{ApiError, ApiResult};
use crate::service::PriceService;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CalculatePriceRequest {
    pub product_id: i64,
    pub user_id: Option<i64>,
    #[validate(length(min = 3, max = 8, message = "must be 3 to 8 characters"))]
    pub currency_code: Option<String>,
}

/// Shared by `/admin/carts/calculate-price` and
/// `/admin/orders/calculate-price`; the two contracts are identical.
pub async fn calculate_price(
    State(s): State<AppState>,
    Json(r): Json<CalculatePriceRequest>,
) -> ApiResult<Json<Quote>> {
    r.validate()?;
    if let Some(user_id) = r.user_id {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&s.db)
            .await?;
        if exists.is_none() {
            return Err(ApiError::field("user_id", "unknown user"));
        }
    }
    let quote = PriceService::new(&s.db)
        .resolve(r.product_id, r.user_id, r.currency_code)
        .await?;
    Ok(Json(quote))
}
