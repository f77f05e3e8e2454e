//! Discount admin CRUD.
//!
//! A discount applies to a (product, user) pair only when it is linked to
//! both sides; scope arrays are replaced wholesale on update.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{ListParams, PaginatedResponse};
use crate::{events, AppState};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Discount {
    pub id: i64,
    pub name: String,
    pub percentage: Decimal,
    pub is_posted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DiscountResponse {
    #[serde(flatten)]
    pub discount: Discount,
    pub product_ids: Vec<i64>,
    pub user_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DiscountRequest {
    #[validate(length(min = 1, max = 255, message = "must be 1 to 255 characters"))]
    pub name: String,
    pub percentage: Decimal,
    #[serde(default)]
    pub is_posted: bool,
    #[serde(default)]
    pub product_ids: Vec<i64>,
    #[serde(default)]
    pub user_ids: Vec<i64>,
}

impl DiscountRequest {
    async fn check(&self, db: &PgPool) -> ApiResult<()> {
        self.validate()?;
        if self.percentage < Decimal::ZERO || self.percentage > Decimal::ONE_HUNDRED {
            return Err(ApiError::field("percentage", "must be between 0 and 100"));
        }
        let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE id = ANY($1)")
            .bind(&self.product_ids)
            .fetch_one(db)
            .await?;
        if known != self.product_ids.len() as i64 {
            return Err(ApiError::field("product_ids", "unknown product"));
        }
        let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ANY($1)")
            .bind(&self.user_ids)
            .fetch_one(db)
            .await?;
        if known != self.user_ids.len() as i64 {
            return Err(ApiError::field("user_ids", "unknown user"));
        }
        Ok(())
    }
}

async fn replace_scope(
    tx: &mut Transaction<'_, Postgres>,
    discount_id: i64,
    r: &DiscountRequest,
) -> ApiResult<()> {
    sqlx::query("DELETE FROM discount_products WHERE discount_id = $1")
        .bind(discount_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM discount_users WHERE discount_id = $1")
        .bind(discount_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        "INSERT INTO discount_products (discount_id, product_id) \
         SELECT $1, UNNEST($2::BIGINT[])",
    )
    .bind(discount_id)
    .bind(&r.product_ids)
    .execute(&mut **tx)
    .await?;
    sqlx::query(
        "INSERT INTO discount_users (discount_id, user_id) \
         SELECT $1, UNNEST($2::BIGINT[])",
    )
    .bind(discount_id)
    .bind(&r.user_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn scope_of(db: &PgPool, discount: Discount) -> ApiResult<DiscountResponse> {
    let product_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT product_id FROM discount_products WHERE discount_id = $1 ORDER BY product_id",
    )
    .bind(discount.id)
    .fetch_all(db)
    .await?;
    let user_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT user_id FROM discount_users WHERE discount_id = $1 ORDER BY user_id",
    )
    .bind(discount.id)
    .fetch_all(db)
    .await?;
    Ok(DiscountResponse { discount, product_ids, user_ids })
}

pub async fn list_discounts(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> ApiResult<Json<PaginatedResponse<Discount>>> {
    let (page, limit, offset) = p.window();
    let discounts = sqlx::query_as::<_, Discount>(
        "SELECT * FROM discounts ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&s.db)
    .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discounts")
        .fetch_one(&s.db)
        .await?;
    Ok(Json(PaginatedResponse { data: discounts, total, page }))
}

pub async fn get_discount(
    State(s): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DiscountResponse>> {
    let discount = sqlx::query_as::<_, Discount>("SELECT * FROM discounts WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("discount"))?;
    Ok(Json(scope_of(&s.db, discount).await?))
}

pub async fn create_discount(
    State(s): State<AppState>,
    Json(r): Json<DiscountRequest>,
) -> ApiResult<(StatusCode, Json<DiscountResponse>)> {
    r.check(&s.db).await?;
    let mut tx = s.db.begin().await?;
    let discount = sqlx::query_as::<_, Discount>(
        "INSERT INTO discounts (name, percentage, is_posted) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&r.name)
    .bind(r.percentage)
    .bind(r.is_posted)
    .fetch_one(&mut *tx)
    .await?;
    replace_scope(&mut tx, discount.id, &r).await?;
    tx.commit().await?;
    let response = scope_of(&s.db, discount).await?;
    events::publish(&s, "backoffice.discount.created", &response).await;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_discount(
    State(s): State<AppState>,
    Path(id): Path<i64>,
    Json(r): Json<DiscountRequest>,
) -> ApiResult<Json<DiscountResponse>> {
    r.check(&s.db).await?;
    let mut tx = s.db.begin().await?;
    let discount = sqlx::query_as::<_, Discount>(
        "UPDATE discounts SET name = $2, percentage = $3, is_posted = $4, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&r.name)
    .bind(r.percentage)
    .bind(r.is_posted)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound("discount"))?;
    replace_scope(&mut tx, discount.id, &r).await?;
    tx.commit().await?;
    let response = scope_of(&s.db, discount).await?;
    events::publish(&s, "backoffice.discount.updated", &response).await;
    Ok(Json(response))
}

pub async fn delete_discount(
    State(s): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM discounts WHERE id = $1 RETURNING id")
        .bind(id)
        .fetch_optional(&s.db)
        .await?;
    match deleted {
        Some(_) => {
            events::publish(&s, "backoffice.discount.deleted", &serde_json::json!({ "id": id }))
                .await;
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound("discount")),
    }
}
