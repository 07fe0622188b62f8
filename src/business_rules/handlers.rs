// HTTP handlers for pricing endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::str::FromStr;
use utoipa::IntoParams;

use crate::business_rules::pricing::{ChargeBreakdown, PricingRule};
use crate::business_rules::types::VehicleCategory;
use crate::error::ApiError;
use crate::rental::rental_days;
use crate::storage::parse_flexible_date;
use crate::AppState;

/// Query for GET /api/pricing/quote
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuoteParams {
    pub category: String,
    pub start_date: String,
    pub end_date: String,
    /// Distance to price; 0 when absent
    pub distance: Option<u32>,
}

/// Handler for GET /api/pricing
/// Lists the pricing rule of every configured category
#[utoipa::path(
    get,
    path = "/api/pricing",
    responses((status = 200, description = "Configured pricing rules", body = Vec<PricingRule>)),
    tag = "pricing"
)]
pub async fn list_pricing_rules(State(state): State<AppState>) -> Json<Vec<PricingRule>> {
    let system = state.system.lock().await;
    Json(system.fees().table().rules().into_iter().cloned().collect())
}

/// Handler for GET /api/pricing/quote
/// Prices a hypothetical rental without creating a booking
#[utoipa::path(
    get,
    path = "/api/pricing/quote",
    params(QuoteParams),
    responses(
        (status = 200, description = "Fee breakdown", body = ChargeBreakdown),
        (status = 400, description = "Invalid category or date")
    ),
    tag = "pricing"
)]
pub async fn quote(
    State(state): State<AppState>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<ChargeBreakdown>, ApiError> {
    let category = VehicleCategory::from_str(&params.category).map_err(ApiError::BadRequest)?;
    let parse = |value: &str, name: &str| {
        parse_flexible_date(value)
            .ok_or_else(|| ApiError::BadRequest(format!("{} is not a valid date", name)))
    };
    let start = parse(&params.start_date, "start_date")?;
    let end = parse(&params.end_date, "end_date")?;
    if start > end {
        return Err(ApiError::BadRequest(
            "start_date cannot be after end_date".to_string(),
        ));
    }

    let system = state.system.lock().await;
    let days = rental_days(start, end);
    Ok(Json(system.quote(category, days, params.distance.unwrap_or(0))))
}
