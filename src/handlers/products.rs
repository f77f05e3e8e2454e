//! Product admin CRUD. Deletes are soft so existing discount scopes and
//! order history keep their references.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{ListParams, PaginatedResponse};
use crate::{events, AppState};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 255, message = "must be 1 to 255 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
}

impl ProductRequest {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        if self.base_price < Decimal::ZERO {
            return Err(ApiError::field("base_price", "must not be negative"));
        }
        Ok(())
    }
}

pub async fn list_products(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> ApiResult<Json<PaginatedResponse<Product>>> {
    let (page, limit, offset) = p.window();
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE status <> 'deleted' ORDER BY created_at DESC \
         LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&s.db)
    .await?;
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE status <> 'deleted'")
            .fetch_one(&s.db)
            .await?;
    Ok(Json(PaginatedResponse { data: products, total, page }))
}

pub async fn get_product(
    State(s): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND status <> 'deleted'")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("product"))
}

pub async fn create_product(
    State(s): State<AppState>,
    Json(r): Json<ProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    r.check()?;
    let sku = format!("SKU-{:08}", rand::random::<u32>() % 100_000_000);
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (sku, name, description, base_price, status) \
         VALUES ($1, $2, $3, $4, 'active') RETURNING *",
    )
    .bind(&sku)
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.base_price)
    .fetch_one(&s.db)
    .await?;
    events::publish(&s, "backoffice.product.created", &product).await;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(s): State<AppState>,
    Path(id): Path<i64>,
    Json(r): Json<ProductRequest>,
) -> ApiResult<Json<Product>> {
    r.check()?;
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $2, description = $3, base_price = $4, updated_at = NOW() \
         WHERE id = $1 AND status <> 'deleted' RETURNING *",
    )
    .bind(id)
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.base_price)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("product"))?;
    events::publish(&s, "backoffice.product.updated", &product).await;
    Ok(Json(product))
}

pub async fn delete_product(
    State(s): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let deleted: Option<i64> = sqlx::query_scalar(
        "UPDATE products SET status = 'deleted', updated_at = NOW() \
         WHERE id = $1 AND status <> 'deleted' RETURNING id",
    )
    .bind(id)
    .fetch_optional(&s.db)
    .await?;
    match deleted {
        Some(_) => {
            events::publish(&s, "backoffice.product.deleted", &serde_json::json!({ "id": id }))
                .await;
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound("product")),
    }
}
