//! Currency admin CRUD.
//!
//! The base-currency flag lives on the rows themselves, so promoting a new
//! base clears the old flag and sets the new one inside one transaction.
//! A partial unique index on `is_base` backstops the at-most-one invariant.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::{events, AppState};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Currency {
    pub id: i64,
    pub code: String,
    pub symbol: String,
    pub is_base: bool,
    pub exchange_rate: Decimal,
    pub correction_factor: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CurrencyRequest {
    #[validate(length(min = 3, max = 8, message = "must be 3 to 8 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 8, message = "must be 1 to 8 characters"))]
    pub symbol: String,
    pub exchange_rate: Decimal,
    pub correction_factor: Option<Decimal>,
    #[serde(default)]
    pub is_base: bool,
}

impl CurrencyRequest {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        if self.exchange_rate <= Decimal::ZERO {
            return Err(ApiError::field("exchange_rate", "must be positive"));
        }
        if matches!(self.correction_factor, Some(f) if f <= Decimal::ZERO) {
            return Err(ApiError::field("correction_factor", "must be positive"));
        }
        Ok(())
    }
}

pub async fn list_currencies(State(s): State<AppState>) -> ApiResult<Json<Vec<Currency>>> {
    let currencies =
        sqlx::query_as::<_, Currency>("SELECT * FROM currencies ORDER BY code")
            .fetch_all(&s.db)
            .await?;
    Ok(Json(currencies))
}

pub async fn get_currency(
    State(s): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Currency>> {
    sqlx::query_as::<_, Currency>("SELECT * FROM currencies WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("currency"))
}

pub async fn create_currency(
    State(s): State<AppState>,
    Json(r): Json<CurrencyRequest>,
) -> ApiResult<(StatusCode, Json<Currency>)> {
    r.check()?;
    let mut tx = s.db.begin().await?;
    if r.is_base {
        sqlx::query("UPDATE currencies SET is_base = FALSE, updated_at = NOW() WHERE is_base")
            .execute(&mut *tx)
            .await?;
    }
    let currency = sqlx::query_as::<_, Currency>(
        "INSERT INTO currencies (code, symbol, is_base, exchange_rate, correction_factor) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(r.code.trim().to_uppercase())
    .bind(&r.symbol)
    .bind(r.is_base)
    .bind(r.exchange_rate)
    .bind(r.correction_factor)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    events::publish(&s, "backoffice.currency.created", &currency).await;
    Ok((StatusCode::CREATED, Json(currency)))
}

pub async fn update_currency(
    State(s): State<AppState>,
    Path(id): Path<i64>,
    Json(r): Json<CurrencyRequest>,
) -> ApiResult<Json<Currency>> {
    r.check()?;
    let mut tx = s.db.begin().await?;
    let was_base: Option<bool> = sqlx::query_scalar("SELECT is_base FROM currencies WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let was_base = was_base.ok_or(ApiError::NotFound("currency"))?;
    if was_base && !r.is_base {
        // Demoting without a replacement would leave no base currency at all.
        return Err(ApiError::field(
            "is_base",
            "mark another currency as base first",
        ));
    }
    if r.is_base && !was_base {
        sqlx::query("UPDATE currencies SET is_base = FALSE, updated_at = NOW() WHERE is_base")
            .execute(&mut *tx)
            .await?;
    }
    let currency = sqlx::query_as::<_, Currency>(
        "UPDATE currencies SET code = $2, symbol = $3, is_base = $4, exchange_rate = $5, \
         correction_factor = $6, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(r.code.trim().to_uppercase())
    .bind(&r.symbol)
    .bind(r.is_base)
    .bind(r.exchange_rate)
    .bind(r.correction_factor)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    events::publish(&s, "backoffice.currency.updated", &currency).await;
    Ok(Json(currency))
}

pub async fn delete_currency(
    State(s): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let is_base: Option<bool> = sqlx::query_scalar("SELECT is_base FROM currencies WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?;
    match is_base {
        None => Err(ApiError::NotFound("currency")),
        Some(true) => Err(ApiError::field("id", "cannot delete the base currency")),
        Some(false) => {
            sqlx::query("DELETE FROM currencies WHERE id = $1")
                .bind(id)
                .execute(&s.db)
                .await?;
            events::publish(&s, "backoffice.currency.deleted", &serde_json::json!({ "id": id }))
                .await;
            Ok(StatusCode::NO_CONTENT)
        }
    }
}
