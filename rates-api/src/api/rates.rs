//! Daily average rates endpoint

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

use crate::models::{AveragePrices, FieldError, RatesQuery};
use crate::prices::get_average_prices;
use crate::validation::validate_rates_query;
use crate::AppState;

/// GET /rates?date_from=YYYY-MM-DD&date_to=YYYY-MM-DD&origin=..&destination=..
///
/// Returns one `{day, average_price}` entry per day of the inclusive range.
/// `origin` and `destination` may each be a port code or a region slug.
/// Parameters are read as raw pairs so a repeated one still reaches
/// validation instead of failing extraction.
pub async fn get_rates(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<AveragePrices>, RatesError> {
    let query = RatesQuery::from_pairs(params);
    let request = validate_rates_query(query).map_err(RatesError::Validation)?;

    debug!(
        "GET /rates origin={} destination={} from={} to={}",
        request.origin, request.destination, request.date_from, request.date_to
    );

    let prices = get_average_prices(&state.db, &request, state.query_timeout)
        .await
        .map_err(RatesError::Storage)?;

    Ok(Json(prices))
}

/// Rates API errors
#[derive(Debug)]
pub enum RatesError {
    /// Request rejected at the boundary (422)
    Validation(Vec<FieldError>),
    /// Storage failure or timeout (500). Details are logged, not returned.
    Storage(rates_common::Error),
}

impl IntoResponse for RatesError {
    fn into_response(self) -> Response {
        match self {
            RatesError::Validation(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": detail })),
            )
                .into_response(),
            RatesError::Storage(e) => {
                error!("Failed to load average prices: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
