// Query parameter parsing for search, listing and report endpoints
//
// Handlers receive raw strings from the query string; `QueryValidator`
// trims them, parses dates in any accepted format and turns them into
// engine criteria.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use utoipa::IntoParams;

use crate::business_rules::search::{BookingPhase, BookingSearchCriteria, VehicleSearchCriteria};
use crate::business_rules::types::{VehicleCategory, VehicleStatus};
use crate::error::ApiError;
use crate::storage::parse_flexible_date;

/// GET /api/vehicles/search
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VehicleSearchParams {
    /// Substring of the category name, e.g. "suv"
    pub category: Option<String>,
    /// Highest acceptable daily rate
    pub max_price: Option<String>,
    /// Start of the range the vehicle must be free for
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    /// Substring of the model name
    pub model: Option<String>,
}

/// GET /api/bookings/search
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingSearchParams {
    pub customer_name: Option<String>,
    pub vehicle_model: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub booking_id: Option<String>,
    /// upcoming, active, completed or cancelable
    pub status: Option<String>,
}

/// GET /api/vehicles/best-matches
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BestMatchParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub max_budget: Option<String>,
    pub preferred_category: Option<String>,
}

/// GET /api/bookings
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingListParams {
    /// Substring of the customer name
    pub name: Option<String>,
    /// Bookings covering this date
    pub date: Option<String>,
    pub customer_id: Option<String>,
}

/// GET /api/bookings/:id/charge
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChargeParams {
    /// Distance actually driven; the booking's declared distance when absent
    pub actual_distance: Option<u32>,
}

/// GET /api/reports/revenue
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Validated best-match request
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatchQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub max_budget: Decimal,
    pub preferred_category: Option<VehicleCategory>,
}

/// Validated booking listing filter; at most one filter applies
#[derive(Debug, Clone, PartialEq)]
pub enum BookingListFilter {
    All,
    CustomerName(String),
    Date(NaiveDate),
    Customer(String),
}

/// Query parameter error
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
}

impl QueryError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        ApiError::BadRequest(error.message)
    }
}

/// Query parameter validator
pub struct QueryValidator;

impl QueryValidator {
    pub fn vehicle_search(params: VehicleSearchParams) -> Result<VehicleSearchCriteria, QueryError> {
        let max_price = Self::parse_decimal(params.max_price, "max_price")?;
        if let Some(price) = max_price {
            if price.is_sign_negative() {
                return Err(QueryError::new("max_price must not be negative"));
            }
        }

        let start = Self::parse_date(params.start_date, "start_date")?;
        let end = Self::parse_date(params.end_date, "end_date")?;
        let date_range = match (start, end) {
            (Some(start), Some(end)) => Some(Self::ordered(start, end)?),
            (None, None) => None,
            _ => {
                return Err(QueryError::new(
                    "start_date and end_date must be given together",
                ))
            }
        };

        let status = Self::normalize_string(params.status)
            .map(|s| VehicleStatus::from_str(&s))
            .transpose()
            .map_err(QueryError::new)?;

        Ok(VehicleSearchCriteria {
            category: Self::normalize_string(params.category),
            max_price,
            date_range,
            status,
            model_keyword: Self::normalize_string(params.model),
        })
    }

    pub fn booking_search(params: BookingSearchParams) -> Result<BookingSearchCriteria, QueryError> {
        let from = Self::parse_date(params.from, "from")?;
        let to = Self::parse_date(params.to, "to")?;
        let phase = Self::normalize_string(params.status)
            .map(|s| BookingPhase::from_str(&s))
            .transpose()
            .map_err(QueryError::new)?;

        Ok(BookingSearchCriteria {
            customer_name: Self::normalize_string(params.customer_name),
            vehicle_model: Self::normalize_string(params.vehicle_model),
            from,
            to,
            booking_id: Self::normalize_string(params.booking_id),
            phase,
        })
    }

    pub fn best_match(params: BestMatchParams) -> Result<BestMatchQuery, QueryError> {
        let start = Self::parse_date(params.start_date, "start_date")?
            .ok_or_else(|| QueryError::new("start_date is required"))?;
        let end = Self::parse_date(params.end_date, "end_date")?
            .ok_or_else(|| QueryError::new("end_date is required"))?;
        let (start, end) = Self::ordered(start, end)?;
        let max_budget = Self::parse_decimal(params.max_budget, "max_budget")?
            .ok_or_else(|| QueryError::new("max_budget is required"))?;
        let preferred_category = Self::normalize_string(params.preferred_category)
            .map(|s| VehicleCategory::from_str(&s))
            .transpose()
            .map_err(QueryError::new)?;

        Ok(BestMatchQuery {
            start,
            end,
            max_budget,
            preferred_category,
        })
    }

    pub fn booking_list(params: BookingListParams) -> Result<BookingListFilter, QueryError> {
        let name = Self::normalize_string(params.name);
        let date = Self::parse_date(params.date, "date")?;
        let customer_id = Self::normalize_string(params.customer_id);

        match (name, date, customer_id) {
            (None, None, None) => Ok(BookingListFilter::All),
            (Some(name), None, None) => Ok(BookingListFilter::CustomerName(name)),
            (None, Some(date), None) => Ok(BookingListFilter::Date(date)),
            (None, None, Some(id)) => Ok(BookingListFilter::Customer(id)),
            _ => Err(QueryError::new(
                "use only one of name, date or customer_id",
            )),
        }
    }

    pub fn date_range(params: DateRangeParams) -> Result<(Option<NaiveDate>, Option<NaiveDate>), QueryError> {
        let from = Self::parse_date(params.from, "from")?;
        let to = Self::parse_date(params.to, "to")?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(QueryError::new("from cannot be after to"));
            }
        }
        Ok((from, to))
    }

    fn ordered(start: NaiveDate, end: NaiveDate) -> Result<(NaiveDate, NaiveDate), QueryError> {
        if start > end {
            Err(QueryError::new("start_date cannot be after end_date"))
        } else {
            Ok((start, end))
        }
    }

    /// Trim; empty means absent
    fn normalize_string(s: Option<String>) -> Option<String> {
        s.and_then(|s| {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }

    fn parse_date(s: Option<String>, param_name: &str) -> Result<Option<NaiveDate>, QueryError> {
        Self::normalize_string(s)
            .map(|value| {
                parse_flexible_date(&value).ok_or_else(|| {
                    QueryError::new(format!(
                        "{} must be a date in yyyy-MM-dd, dd/MM/yyyy or MM/dd/yyyy form",
                        param_name
                    ))
                })
            })
            .transpose()
    }

    fn parse_decimal(s: Option<String>, param_name: &str) -> Result<Option<Decimal>, QueryError> {
        Self::normalize_string(s)
            .map(|value| {
                Decimal::from_str(&value)
                    .map_err(|_| QueryError::new(format!("{} must be a number", param_name)))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_vehicle_search_defaults() {
        let criteria = QueryValidator::vehicle_search(VehicleSearchParams::default()).unwrap();
        assert!(criteria.category.is_none());
        assert!(criteria.max_price.is_none());
        assert!(criteria.date_range.is_none());
        assert!(criteria.status.is_none());
    }

    #[test]
    fn test_vehicle_search_parses_everything() {
        let criteria = QueryValidator::vehicle_search(VehicleSearchParams {
            category: Some("  suv ".to_string()),
            max_price: Some("12000.50".to_string()),
            start_date: Some("2025-03-10".to_string()),
            end_date: Some("16/03/2025".to_string()),
            status: Some("available".to_string()),
            model: Some("".to_string()),
        })
        .unwrap();

        assert_eq!(criteria.category.as_deref(), Some("suv"));
        assert_eq!(criteria.max_price, Some(dec!(12000.50)));
        assert_eq!(criteria.date_range, Some((date(2025, 3, 10), date(2025, 3, 16))));
        assert_eq!(criteria.status, Some(VehicleStatus::Available));
        assert!(criteria.model_keyword.is_none());
    }

    #[test]
    fn test_vehicle_search_rejects_half_range() {
        let result = QueryValidator::vehicle_search(VehicleSearchParams {
            start_date: Some("2025-03-10".to_string()),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_inverted_ranges_are_rejected() {
        let error = QueryValidator::vehicle_search(VehicleSearchParams {
            start_date: Some("2025-03-16".to_string()),
            end_date: Some("2025-03-10".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(error.to_string(), "start_date cannot be after end_date");

        let error = QueryValidator::best_match(BestMatchParams {
            start_date: Some("2025-06-03".to_string()),
            end_date: Some("2025-06-01".to_string()),
            max_budget: Some("40000".to_string()),
            preferred_category: None,
        })
        .unwrap_err();
        assert!(matches!(ApiError::from(error), ApiError::BadRequest(_)));

        // Single-day ranges are fine
        assert!(QueryValidator::vehicle_search(VehicleSearchParams {
            start_date: Some("2025-03-10".to_string()),
            end_date: Some("2025-03-10".to_string()),
            ..Default::default()
        })
        .is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(QueryValidator::vehicle_search(VehicleSearchParams {
            max_price: Some("cheap".to_string()),
            ..Default::default()
        })
        .is_err());
        assert!(QueryValidator::vehicle_search(VehicleSearchParams {
            status: Some("parked".to_string()),
            ..Default::default()
        })
        .is_err());
        assert!(QueryValidator::booking_search(BookingSearchParams {
            from: Some("2025-13-40".to_string()),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_booking_search_phase() {
        let criteria = QueryValidator::booking_search(BookingSearchParams {
            status: Some("Cancellable".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(criteria.phase, Some(BookingPhase::Cancelable));
    }

    #[test]
    fn test_best_match_requires_dates_and_budget() {
        assert!(QueryValidator::best_match(BestMatchParams::default()).is_err());

        let query = QueryValidator::best_match(BestMatchParams {
            start_date: Some("2025-06-01".to_string()),
            end_date: Some("2025-06-03".to_string()),
            max_budget: Some("40000".to_string()),
            preferred_category: Some("Electric".to_string()),
        })
        .unwrap();
        assert_eq!(query.max_budget, dec!(40000));
        assert_eq!(query.preferred_category, Some(VehicleCategory::Electric));
    }

    #[test]
    fn test_booking_list_accepts_one_filter() {
        assert_eq!(
            QueryValidator::booking_list(BookingListParams::default()).unwrap(),
            BookingListFilter::All
        );
        assert_eq!(
            QueryValidator::booking_list(BookingListParams {
                date: Some("03/10/2025".to_string()),
                ..Default::default()
            })
            .unwrap(),
            BookingListFilter::Date(date(2025, 10, 3))
        );
        assert!(QueryValidator::booking_list(BookingListParams {
            name: Some("Nimal".to_string()),
            customer_id: Some("C001".to_string()),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_date_range_order() {
        assert!(QueryValidator::date_range(DateRangeParams {
            from: Some("2025-05-01".to_string()),
            to: Some("2025-04-01".to_string()),
        })
        .is_err());
    }
}
