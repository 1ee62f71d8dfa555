//! Daily average price aggregation
//!
//! One aggregate query per request groups matching raw prices by day. Days
//! with fewer than [`MIN_PRICES_PER_DAY`] observations report no average,
//! and every day of the requested range appears exactly once in the output.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use rates_common::{Error, Result};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::models::{AveragePrice, AveragePrices, RatesRequest};

/// Minimum observations for a day's average to be reported
pub const MIN_PRICES_PER_DAY: i64 = 3;

/// Averages are rounded half-up to this many decimal places
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Origin and destination keys are expanded through `codes`; a port code
/// maps to itself there, so ports and regions share this one query.
const DAILY_PRICES_SQL: &str = r#"
    SELECT prices.day AS day,
           AVG(prices.price) AS avg_price,
           COUNT(prices.price) AS prices_count
    FROM prices
    JOIN (SELECT DISTINCT code FROM codes WHERE key = ?) AS origin_codes
        ON prices.orig_code = origin_codes.code
    JOIN (SELECT DISTINCT code FROM codes WHERE key = ?) AS destination_codes
        ON prices.dest_code = destination_codes.code
    WHERE prices.day BETWEEN ? AND ?
    GROUP BY prices.day
    ORDER BY prices.day
"#;

/// Aggregate row for one day that has at least one matching price
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DailyPrices {
    pub day: NaiveDate,
    pub avg_price: f64,
    pub prices_count: i64,
}

/// Run the aggregate query for a request
///
/// Unknown origin or destination keys match nothing and yield no rows.
pub async fn fetch_daily_prices(pool: &SqlitePool, request: &RatesRequest) -> Result<Vec<DailyPrices>> {
    let rows = sqlx::query_as::<_, DailyPrices>(DAILY_PRICES_SQL)
        .bind(&request.origin)
        .bind(&request.destination)
        .bind(request.date_from)
        .bind(request.date_to)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Round half-up (midpoint away from zero) to [`PRICE_DECIMAL_PLACES`]
pub fn round_price(value: f64) -> Option<f64> {
    Decimal::from_f64(value)?
        .round_dp_with_strategy(PRICE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
}

/// Reported average for a day, or `None` below the confidence threshold
pub fn day_average_price(row: &DailyPrices) -> Option<f64> {
    if row.prices_count < MIN_PRICES_PER_DAY {
        return None;
    }
    round_price(row.avg_price)
}

/// Every calendar day from `date_from` to `date_to`, inclusive
pub fn period_days(date_from: NaiveDate, date_to: NaiveDate) -> Vec<NaiveDate> {
    date_from
        .iter_days()
        .take_while(|day| *day <= date_to)
        .collect()
}

/// Gap-fill aggregate rows into one entry per day of the range
///
/// Rows outside the range are ignored.
pub fn process_prices(rows: &[DailyPrices], date_from: NaiveDate, date_to: NaiveDate) -> AveragePrices {
    let found: HashMap<NaiveDate, Option<f64>> = rows
        .iter()
        .map(|row| (row.day, day_average_price(row)))
        .collect();

    period_days(date_from, date_to)
        .into_iter()
        .map(|day| AveragePrice {
            day,
            average_price: found.get(&day).copied().flatten(),
        })
        .collect()
}

/// Daily average prices for a validated request
///
/// `timeout` bounds the single storage round trip; expiry is reported as
/// [`Error::Timeout`]. Dropping the returned future abandons the query.
pub async fn get_average_prices(
    pool: &SqlitePool,
    request: &RatesRequest,
    timeout: Option<Duration>,
) -> Result<AveragePrices> {
    let rows = match timeout {
        Some(limit) => tokio::time::timeout(limit, fetch_daily_prices(pool, request))
            .await
            .map_err(|_| Error::Timeout(limit))??,
        None => fetch_daily_prices(pool, request).await?,
    };

    debug!(
        "{} -> {} [{} .. {}]: {} days with prices",
        request.origin,
        request.destination,
        request.date_from,
        request.date_to,
        rows.len()
    );

    Ok(process_prices(&rows, request.date_from, request.date_to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(day: NaiveDate, avg_price: f64, prices_count: i64) -> DailyPrices {
        DailyPrices {
            day,
            avg_price,
            prices_count,
        }
    }

    #[test]
    fn test_day_average_price_below_threshold_is_none() {
        for count in 0..MIN_PRICES_PER_DAY {
            assert_eq!(day_average_price(&row(date(2022, 7, 1), 100.0, count)), None);
        }
    }

    #[test]
    fn test_day_average_price_rounds_to_two_places() {
        assert_eq!(
            day_average_price(&row(date(2022, 7, 1), 175.5345, 3)),
            Some(175.53)
        );
        assert_eq!(day_average_price(&row(date(2022, 7, 1), 150.0, 4)), Some(150.0));
    }

    #[test]
    fn test_round_price_midpoint_goes_up() {
        assert_eq!(round_price(0.125), Some(0.13));
        assert_eq!(round_price(1111.91), Some(1111.91));
        assert_eq!(round_price(99.999), Some(100.0));
    }

    #[test]
    fn test_period_days_inclusive() {
        let days = period_days(date(2022, 2, 27), date(2022, 3, 2));
        assert_eq!(
            days,
            vec![date(2022, 2, 27), date(2022, 2, 28), date(2022, 3, 1), date(2022, 3, 2)]
        );
        assert_eq!(period_days(date(2022, 7, 1), date(2022, 7, 1)), vec![date(2022, 7, 1)]);
    }

    #[test]
    fn test_process_prices_fills_missing_days() {
        let rows = vec![
            row(date(2022, 7, 1), 100.0, 2),
            row(date(2022, 7, 2), 200.0, 4),
        ];

        let prices = process_prices(&rows, date(2022, 7, 1), date(2022, 7, 4));

        assert_eq!(
            prices,
            vec![
                AveragePrice { day: date(2022, 7, 1), average_price: None },
                AveragePrice { day: date(2022, 7, 2), average_price: Some(200.0) },
                AveragePrice { day: date(2022, 7, 3), average_price: None },
                AveragePrice { day: date(2022, 7, 4), average_price: None },
            ]
        );
    }

    #[test]
    fn test_process_prices_without_rows_is_all_null() {
        let prices = process_prices(&[], date(2020, 1, 1), date(2020, 12, 31));

        assert_eq!(prices.len(), 366);
        assert!(prices.iter().all(|p| p.average_price.is_none()));
        assert_eq!(prices.first().unwrap().day, date(2020, 1, 1));
        assert_eq!(prices.last().unwrap().day, date(2020, 12, 31));
        assert!(prices.windows(2).all(|w| w[0].day < w[1].day));
    }

    #[test]
    fn test_process_prices_ignores_rows_outside_range() {
        let rows = vec![row(date(2022, 6, 30), 10.0, 5), row(date(2022, 7, 1), 1111.91, 3)];

        let prices = process_prices(&rows, date(2022, 7, 1), date(2022, 7, 1));

        assert_eq!(
            prices,
            vec![AveragePrice { day: date(2022, 7, 1), average_price: Some(1111.91) }]
        );
    }

    #[tokio::test]
    async fn test_get_average_prices_reports_timeout() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        // Hold the only connection so the aggregate query never starts
        let _held = pool.acquire().await.unwrap();

        let request = RatesRequest {
            date_from: date(2022, 7, 1),
            date_to: date(2022, 7, 2),
            origin: "CNSGH".to_string(),
            destination: "NLRTM".to_string(),
        };
        let limit = Duration::from_millis(20);

        let result = get_average_prices(&pool, &request, Some(limit)).await;

        assert!(matches!(result, Err(Error::Timeout(elapsed)) if elapsed == limit));
    }

    #[test]
    fn test_timeout_message_keeps_sub_millisecond_bound() {
        assert_eq!(
            Error::Timeout(Duration::from_nanos(1)).to_string(),
            "Query timed out after 1ns"
        );
    }
}
