//! Back-office pricing service entrypoint.

use anyhow::Result;
use axum::routing::{get, post};
use axum::{Json, Router};
use backoffice_pricing::{handlers, AppState};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&std::env::var("DATABASE_URL")?)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match std::env::var("NATS_URL") {
        Ok(url) => async_nats::connect(&url).await.ok(),
        Err(_) => None,
    };
    let state = AppState { db, nats };

    let app = Router::new()
        .route("/health", get(|| async {
            Json(serde_json::json!({"status": "healthy", "service": "backoffice-pricing"}))
        }))
        .route("/admin/carts/calculate-price", post(handlers::pricing::calculate_price))
        .route("/admin/orders/calculate-price", post(handlers::pricing::calculate_price))
        .route(
            "/admin/currencies",
            get(handlers::currencies::list_currencies).post(handlers::currencies::create_currency),
        )
        .route(
            "/admin/currencies/:id",
            get(handlers::currencies::get_currency)
                .put(handlers::currencies::update_currency)
                .delete(handlers::currencies::delete_currency),
        )
        .route(
            "/admin/discounts",
            get(handlers::discounts::list_discounts).post(handlers::discounts::create_discount),
        )
        .route(
            "/admin/discounts/:id",
            get(handlers::discounts::get_discount)
                .put(handlers::discounts::update_discount)
                .delete(handlers::discounts::delete_discount),
        )
        .route(
            "/admin/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/admin/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8083".to_string());
    tracing::info!("🚀 backoffice-pricing listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
