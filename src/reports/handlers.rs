// HTTP handlers for reports and the health check

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::ApiError;
use crate::query::{DateRangeParams, QueryValidator};
use crate::rental::{CallerIdentity, RentalSystem};
use crate::reports::{
    CustomerReport, HealthMonitor, HealthReport, HealthStatus, Reminder, ReportGenerator,
    RevenueReport, SystemSummary, UtilizationReport,
};
use crate::AppState;

/// Handler for GET /api/reports/revenue
#[utoipa::path(
    get,
    path = "/api/reports/revenue",
    params(DateRangeParams),
    responses(
        (status = 200, description = "Estimated revenue by category", body = RevenueReport),
        (status = 403, description = "Caller is not an administrator")
    ),
    tag = "reports"
)]
pub async fn revenue_report(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<RevenueReport>, ApiError> {
    RentalSystem::require_administrator(&caller, "Revenue reports")?;
    let (from, to) = QueryValidator::date_range(params)?;

    let system = state.system.lock().await;
    Ok(Json(ReportGenerator::for_system(&system).revenue(from, to)))
}

/// Handler for GET /api/reports/utilization
#[utoipa::path(
    get,
    path = "/api/reports/utilization",
    responses((status = 200, description = "Fleet status by category", body = UtilizationReport)),
    tag = "reports"
)]
pub async fn utilization_report(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<UtilizationReport>, ApiError> {
    RentalSystem::require_administrator(&caller, "Utilization reports")?;

    let system = state.system.lock().await;
    Ok(Json(ReportGenerator::for_system(&system).utilization()))
}

/// Handler for GET /api/reports/summary
#[utoipa::path(
    get,
    path = "/api/reports/summary",
    responses((status = 200, description = "Catalog totals", body = SystemSummary)),
    tag = "reports"
)]
pub async fn summary_report(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<SystemSummary>, ApiError> {
    RentalSystem::require_administrator(&caller, "System summaries")?;

    let system = state.system.lock().await;
    Ok(Json(ReportGenerator::for_system(&system).summary()))
}

/// Handler for GET /api/reports/reminders
#[utoipa::path(
    get,
    path = "/api/reports/reminders",
    responses(
        (status = 200, description = "Pickups and returns due tomorrow", body = Vec<Reminder>),
        (status = 403, description = "Caller is not an administrator")
    ),
    tag = "reports"
)]
pub async fn reminders_report(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<Reminder>>, ApiError> {
    RentalSystem::require_administrator(&caller, "Reminder lists")?;

    let system = state.system.lock().await;
    let today = system.today();
    Ok(Json(ReportGenerator::for_system(&system).reminders_due(today)))
}

/// Handler for GET /api/reports/customers/:id
#[utoipa::path(
    get,
    path = "/api/reports/customers/{id}",
    params(("id" = String, Path, description = "National ID or passport number")),
    responses(
        (status = 200, description = "Booking history with estimated costs", body = CustomerReport),
        (status = 404, description = "Customer not found")
    ),
    tag = "reports"
)]
pub async fn customer_report(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<CustomerReport>, ApiError> {
    RentalSystem::require_access(&caller, &id)?;

    let system = state.system.lock().await;
    Ok(Json(ReportGenerator::for_system(&system).customer(&id)?))
}

/// Handler for GET /api/health
/// Responds 503 when any component is critical
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Healthy or warning", body = HealthReport),
        (status = 503, description = "A component is critical", body = HealthReport)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let system = state.system.lock().await;
    let report = HealthMonitor::check(&system);

    let status = match report.status {
        HealthStatus::Critical => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (status, Json(report))
}
