//! HTTP API handlers for rates-api

pub mod health;
pub mod rates;

pub use health::health_routes;
pub use rates::{get_rates, RatesError};
