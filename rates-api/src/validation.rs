//! Boundary validation for `GET /rates`
//!
//! Inputs are rejected, never guessed at: a value either parses exactly or
//! produces a [`FieldError`].

use chrono::NaiveDate;

use crate::models::{FieldError, RatesQuery, RatesRequest};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const KIND_MISSING: &str = "value_error.missing";
pub const KIND_DATE: &str = "value_error.date";
pub const KIND_MIN_LENGTH: &str = "value_error.any_str.min_length";
pub const KIND_DATE_ORDER: &str = "value_error.date_order";

/// Parse a `YYYY-MM-DD` date, rejecting trailing time components
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| format!("date should be in `%Y-%m-%d` (2020-10-10) format, got '{}'", raw))
}

/// Validate the raw query, collecting every field error
///
/// Errors are reported in field order. The date ordering check only runs
/// when every field is otherwise valid.
pub fn validate_rates_query(query: RatesQuery) -> Result<RatesRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let date_from = required_date(&mut errors, "date_from", query.date_from.as_deref());
    let date_to = required_date(&mut errors, "date_to", query.date_to.as_deref());
    let origin = required_location(&mut errors, "origin", query.origin.as_deref());
    let destination = required_location(&mut errors, "destination", query.destination.as_deref());

    match (date_from, date_to) {
        (Some(from), Some(to)) if errors.is_empty() && from > to => {
            errors.push(FieldError::query(
                "date_from",
                format!(
                    "`date_from` should be before `date_to`, got `date_from`: '{}' and `date_to`: '{}'",
                    from.format(DATE_FORMAT),
                    to.format(DATE_FORMAT)
                ),
                KIND_DATE_ORDER,
            ));
        }
        _ => {}
    }

    match (date_from, date_to, origin, destination) {
        (Some(date_from), Some(date_to), Some(origin), Some(destination)) if errors.is_empty() => {
            Ok(RatesRequest {
                date_from,
                date_to,
                origin,
                destination,
            })
        }
        _ => Err(errors),
    }
}

fn required_date(errors: &mut Vec<FieldError>, field: &str, raw: Option<&str>) -> Option<NaiveDate> {
    let Some(raw) = raw else {
        errors.push(FieldError::query(field, "field required", KIND_MISSING));
        return None;
    };

    match parse_date(raw) {
        Ok(date) => Some(date),
        Err(msg) => {
            errors.push(FieldError::query(field, msg, KIND_DATE));
            None
        }
    }
}

fn required_location(errors: &mut Vec<FieldError>, field: &str, raw: Option<&str>) -> Option<String> {
    let Some(raw) = raw else {
        errors.push(FieldError::query(field, "field required", KIND_MISSING));
        return None;
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::query(
            field,
            "ensure this value has at least 1 characters",
            KIND_MIN_LENGTH,
        ));
        return None;
    }

    Some(trimmed.to_string())
}
