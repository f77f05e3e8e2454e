//! Database-backed price resolution.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::pricing::{self, ExchangeRate, Quote};
use crate::error::{ApiError, ApiResult};

/// Read-only price resolver over the catalog, discount, and currency tables.
pub struct PriceService<'a> {
    db: &'a PgPool,
}

impl<'a> PriceService<'a> {
    pub fn new(db: &'a PgPool) -> Self {
        Self { db }
    }

    /// Highest posted discount percentage among discounts linked to both the
    /// product and the user. Best single discount wins; discounts never stack.
    pub async fn best_discount(&self, product_id: i64, user_id: i64) -> ApiResult<Option<Decimal>> {
        let pct: Option<Decimal> = sqlx::query_scalar(
            "SELECT MAX(d.percentage) FROM discounts d \
             JOIN discount_products dp ON dp.discount_id = d.id \
             JOIN discount_users du ON du.discount_id = d.id \
             WHERE d.is_posted AND dp.product_id = $1 AND du.user_id = $2",
        )
        .bind(product_id)
        .bind(user_id)
        .fetch_one(self.db)
        .await?;
        Ok(pct)
    }

    /// Code of the single currency marked as base. Looked up per request
    /// rather than hardcoded, so the base can be changed at runtime.
    pub async fn base_currency_code(&self) -> ApiResult<String> {
        sqlx::query_scalar("SELECT code FROM currencies WHERE is_base")
            .fetch_optional(self.db)
            .await?
            .ok_or(ApiError::NotFound("base currency"))
    }

    pub async fn currency_by_code(&self, code: &str) -> ApiResult<Option<ExchangeRate>> {
        Ok(sqlx::query_as::<_, ExchangeRate>(
            "SELECT code, exchange_rate, correction_factor FROM currencies WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(self.db)
        .await?)
    }

    /// Full resolution for one (product, user, currency) triple.
    ///
    /// A missing product is a hard 404. A missing user skips discounting.
    /// A currency code that matches no row is not an error: the amount stays
    /// in base currency and the response still echoes the requested code.
    pub async fn resolve(
        &self,
        product_id: i64,
        user_id: Option<i64>,
        currency_code: Option<String>,
    ) -> ApiResult<Quote> {
        let base_price: Decimal = sqlx::query_scalar(
            "SELECT base_price FROM products WHERE id = $1 AND status <> 'deleted'",
        )
        .bind(product_id)
        .fetch_optional(self.db)
        .await?
        .ok_or(ApiError::NotFound("product"))?;

        let discount = match user_id {
            Some(uid) => self.best_discount(product_id, uid).await?,
            None => None,
        };

        let base_code = self.base_currency_code().await?;
        let requested = currency_code.unwrap_or_else(|| base_code.clone());

        let target = if requested == base_code {
            None
        } else {
            let found = self.currency_by_code(&requested).await?;
            if found.is_none() {
                tracing::warn!(code = %requested, "unknown currency, pricing in base currency");
            }
            found
        };

        Ok(pricing::quote(base_price, discount, target.as_ref(), &requested))
    }
}
