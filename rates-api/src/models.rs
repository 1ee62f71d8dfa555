//! Request and response types for the rates endpoint

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Validated average price request
///
/// Constructed by [`crate::validation::validate_rates_query`]; holds
/// `date_from <= date_to` and non-empty, trimmed identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatesRequest {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    /// Port code or region slug
    pub origin: String,
    /// Port code or region slug
    pub destination: String,
}

/// Average price for one calendar day; `None` means not enough data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragePrice {
    /// Serialized as `YYYY-MM-DD`
    pub day: NaiveDate,
    pub average_price: Option<f64>,
}

pub type AveragePrices = Vec<AveragePrice>;

/// Raw query string of `GET /rates`
///
/// Every field is optional here so that missing parameters are reported by
/// validation, together with any other field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RatesQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

impl RatesQuery {
    /// Collect raw `key=value` pairs; a repeated parameter keeps its last value
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "date_from" => &mut query.date_from,
                "date_to" => &mut query.date_to,
                "origin" => &mut query.origin,
                "destination" => &mut query.destination,
                _ => continue,
            };
            *slot = Some(value);
        }
        query
    }
}

/// One field-scoped validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Location of the offending value, e.g. `["query", "date_from"]`
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn query(field: &str, msg: impl Into<String>, kind: &str) -> Self {
        Self {
            loc: vec!["query".to_string(), field.to_string()],
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }
}
