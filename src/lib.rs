// EcoRide rental API
//
// Vehicle catalog, customer registry and booking engine behind a JSON API.
// All state lives in one `RentalSystem` guarded by a tokio mutex.

pub mod business_rules;
pub mod clock;
pub mod config;
pub mod error;
pub mod query;
pub mod rental;
pub mod reports;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::business_rules::handlers as pricing_handlers;
use crate::rental::handlers as rental_handlers;
use crate::rental::RentalSystem;
use crate::reports::handlers as report_handlers;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        rental_handlers::list_vehicles,
        rental_handlers::create_vehicle,
        rental_handlers::get_vehicle,
        rental_handlers::update_vehicle,
        rental_handlers::delete_vehicle,
        rental_handlers::search_vehicles,
        rental_handlers::best_matches,
        rental_handlers::list_customers,
        rental_handlers::create_customer,
        rental_handlers::get_customer,
        rental_handlers::update_customer,
        rental_handlers::delete_customer,
        rental_handlers::recommendations,
        rental_handlers::list_bookings,
        rental_handlers::create_booking,
        rental_handlers::search_bookings,
        rental_handlers::my_bookings,
        rental_handlers::get_booking,
        rental_handlers::update_booking,
        rental_handlers::delete_booking,
        rental_handlers::cancel_booking,
        rental_handlers::complete_booking,
        rental_handlers::booking_charge,
        rental_handlers::booking_invoice,
        pricing_handlers::list_pricing_rules,
        pricing_handlers::quote,
        report_handlers::revenue_report,
        report_handlers::utilization_report,
        report_handlers::summary_report,
        report_handlers::customer_report,
        report_handlers::reminders_report,
        report_handlers::health_check,
    ),
    components(schemas(
        rental::Vehicle,
        rental::Customer,
        rental::Booking,
        rental::BookingState,
        rental::CreateVehicleRequest,
        rental::UpdateVehicleRequest,
        rental::CreateCustomerRequest,
        rental::UpdateCustomerRequest,
        rental::CreateBookingRequest,
        rental::UpdateBookingRequest,
        business_rules::types::VehicleCategory,
        business_rules::types::VehicleStatus,
        business_rules::pricing::PricingRule,
        business_rules::pricing::ChargeBreakdown,
        business_rules::pricing::Invoice,
        business_rules::search::BestMatch,
        business_rules::search::Recommendation,
        business_rules::metrics::OperationStats,
        business_rules::metrics::MetricsSummary,
        reports::CategoryRevenue,
        reports::RevenueReport,
        reports::CategoryUtilization,
        reports::UtilizationReport,
        reports::CustomerBookingLine,
        reports::CustomerReport,
        reports::SystemSummary,
        reports::ReminderKind,
        reports::Reminder,
        reports::HealthStatus,
        reports::health::ComponentHealth,
        reports::HealthReport,
    )),
    tags(
        (name = "vehicles", description = "Vehicle catalog"),
        (name = "customers", description = "Customer registry"),
        (name = "bookings", description = "Bookings, charges and invoices"),
        (name = "search", description = "Search and recommendations"),
        (name = "pricing", description = "Pricing rules and quotes"),
        (name = "reports", description = "Read-only reports"),
        (name = "health", description = "Health check")
    ),
    info(
        title = "EcoRide Rental API",
        version = "0.1.0",
        description = "Vehicle rental bookings with availability checks and fee calculation"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub system: Arc<Mutex<RentalSystem>>,
}

impl AppState {
    pub fn new(system: RentalSystem) -> Self {
        Self {
            system: Arc::new(Mutex::new(system)),
        }
    }
}

/// Routes without documentation or middleware
fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/vehicles",
            get(rental_handlers::list_vehicles).post(rental_handlers::create_vehicle),
        )
        .route("/api/vehicles/search", get(rental_handlers::search_vehicles))
        .route("/api/vehicles/best-matches", get(rental_handlers::best_matches))
        .route(
            "/api/vehicles/:id",
            get(rental_handlers::get_vehicle)
                .put(rental_handlers::update_vehicle)
                .delete(rental_handlers::delete_vehicle),
        )
        .route(
            "/api/customers",
            get(rental_handlers::list_customers).post(rental_handlers::create_customer),
        )
        .route(
            "/api/customers/:id",
            get(rental_handlers::get_customer)
                .put(rental_handlers::update_customer)
                .delete(rental_handlers::delete_customer),
        )
        .route(
            "/api/customers/:id/recommendations",
            get(rental_handlers::recommendations),
        )
        .route(
            "/api/bookings",
            get(rental_handlers::list_bookings).post(rental_handlers::create_booking),
        )
        .route("/api/bookings/search", get(rental_handlers::search_bookings))
        .route("/api/bookings/mine", get(rental_handlers::my_bookings))
        .route(
            "/api/bookings/:id",
            get(rental_handlers::get_booking)
                .put(rental_handlers::update_booking)
                .delete(rental_handlers::delete_booking),
        )
        .route("/api/bookings/:id/cancel", post(rental_handlers::cancel_booking))
        .route("/api/bookings/:id/complete", post(rental_handlers::complete_booking))
        .route("/api/bookings/:id/charge", get(rental_handlers::booking_charge))
        .route("/api/bookings/:id/invoice", get(rental_handlers::booking_invoice))
        .route("/api/pricing", get(pricing_handlers::list_pricing_rules))
        .route("/api/pricing/quote", get(pricing_handlers::quote))
        .route("/api/reports/revenue", get(report_handlers::revenue_report))
        .route("/api/reports/utilization", get(report_handlers::utilization_report))
        .route("/api/reports/summary", get(report_handlers::summary_report))
        .route("/api/reports/customers/:id", get(report_handlers::customer_report))
        .route("/api/reports/reminders", get(report_handlers::reminders_report))
        .route("/api/health", get(report_handlers::health_check))
}

/// Creates and configures the application router
/// Adds Swagger UI, request tracing and permissive CORS
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests;
