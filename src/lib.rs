//! Back-office pricing service.
//!
//! Computes the price a specific user pays for a specific product in a
//! specific currency: the best posted discount is applied in the store's
//! base currency, the result is converted through the target currency's
//! exchange rate, and the final amount is rounded half-up to 2 decimal
//! places. Admin CRUD for currencies, discounts, and products feeds the
//! read path; the price calculation itself never writes.

pub mod domain;
pub mod error;
pub mod events;
pub mod handlers;
pub mod service;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
}
