// HTTP tests for the EcoRide rental API
// Runs the full router against an in-memory store and a fixed clock

use super::*;
use crate::business_rules::{ChargeBreakdown, MemoryAuditSink, PricingTable};
use crate::clock::FixedClock;
use crate::rental::{
    Booking, BookingState, Catalog, Customer, EngineServices, Vehicle, CUSTOMER_HEADER,
    ROLE_HEADER, USER_HEADER,
};
use crate::business_rules::metrics::PerformanceMetrics;
use crate::storage::MemoryStore;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

/// Server over the sample fleet and one registered customer (C001)
fn create_test_app() -> (TestServer, MemoryStore) {
    let catalog = Catalog::from_parts(
        Vehicle::samples(),
        vec![Customer::new(
            "C001",
            "Nimal Perera",
            "+94 77 123 4567",
            "nimal@example.com",
        )],
        Vec::new(),
    );
    let store = MemoryStore::with_catalog(catalog);
    let services = EngineServices {
        pricing: PricingTable::default(),
        audit: Arc::new(MemoryAuditSink::new()),
        clock: Arc::new(FixedClock(today())),
        metrics: PerformanceMetrics::new(),
    };
    let system = RentalSystem::load(Box::new(store.clone()), services).unwrap();

    let server = TestServer::new(create_router(AppState::new(system))).unwrap();
    (server, store)
}

fn as_admin(request: TestRequest) -> TestRequest {
    request
        .add_header(HeaderName::from_static(USER_HEADER), HeaderValue::from_static("admin"))
        .add_header(
            HeaderName::from_static(ROLE_HEADER),
            HeaderValue::from_static("administrator"),
        )
}

fn as_customer(request: TestRequest, customer_id: &str) -> TestRequest {
    request
        .add_header(HeaderName::from_static(USER_HEADER), HeaderValue::from_static("nimal"))
        .add_header(HeaderName::from_static(ROLE_HEADER), HeaderValue::from_static("customer"))
        .add_header(
            HeaderName::from_static(CUSTOMER_HEADER),
            HeaderValue::from_str(customer_id).unwrap(),
        )
}

fn booking_payload(id: &str, vehicle_id: &str, start: &str, end: &str) -> serde_json::Value {
    json!({
        "booking_id": id,
        "vehicle_id": vehicle_id,
        "start_date": start,
        "end_date": end,
        "total_distance": 600
    })
}

async fn create_booking(server: &TestServer, id: &str) -> Booking {
    let response = as_customer(server.post("/api/bookings"), "C001")
        .json(&booking_payload(id, "V001", "2025-03-10", "2025-03-12"))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

// ============================================================================
// Vehicle Tests
// ============================================================================

#[tokio::test]
async fn test_list_vehicles() {
    let (server, _) = create_test_app();

    let response = server.get("/api/vehicles").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let vehicles: Vec<Vehicle> = response.json();
    assert_eq!(vehicles.len(), 3);
}

#[tokio::test]
async fn test_create_vehicle_as_admin() {
    let (server, store) = create_test_app();

    let payload = json!({
        "id": "V004",
        "model": "Suzuki Alto",
        "category": "compact_petrol",
        "daily_rate": "5000"
    });
    let response = as_admin(server.post("/api/vehicles")).json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let vehicle: Vehicle = response.json();
    assert_eq!(vehicle.id, "V004");
    assert_eq!(vehicle.daily_rate, dec!(5000));
    assert!(vehicle.is_available());
    assert!(store.snapshot().vehicle("V004").is_some());
}

#[tokio::test]
async fn test_create_vehicle_as_customer_is_forbidden() {
    let (server, _) = create_test_app();

    let payload = json!({
        "id": "V004",
        "model": "Suzuki Alto",
        "category": "compact_petrol",
        "daily_rate": "5000"
    });
    let response = as_customer(server.post("/api/vehicles"), "C001")
        .json(&payload)
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_vehicle_without_identity() {
    let (server, _) = create_test_app();

    let payload = json!({
        "id": "V004",
        "model": "Suzuki Alto",
        "category": "compact_petrol",
        "daily_rate": "5000"
    });
    let response = server.post("/api/vehicles").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_vehicle_not_found() {
    let (server, _) = create_test_app();

    let response = server.get("/api/vehicles/V999").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_vehicles_by_category() {
    let (server, _) = create_test_app();

    let response = server
        .get("/api/vehicles/search")
        .add_query_param("category", "Electric")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let vehicles: Vec<Vehicle> = response.json();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].id, "V002");
}

#[tokio::test]
async fn test_search_with_inverted_dates_is_bad_request() {
    let (server, _) = create_test_app();

    let response = server
        .get("/api/vehicles/search")
        .add_query_param("start_date", "2025-03-16")
        .add_query_param("end_date", "2025-03-10")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .get("/api/vehicles/best-matches")
        .add_query_param("start_date", "2025-03-16")
        .add_query_param("end_date", "2025-03-10")
        .add_query_param("max_budget", "100000")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "BAD_REQUEST");
}

// ============================================================================
// Customer Tests
// ============================================================================

#[tokio::test]
async fn test_register_customer() {
    let (server, _) = create_test_app();

    let payload = json!({
        "id": "C002",
        "name": "Kamala Silva",
        "contact_number": "0771234567",
        "email": "kamala@example.com"
    });
    let response = as_customer(server.post("/api/customers"), "C002")
        .json(&payload)
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let customer: Customer = response.json();
    assert_eq!(customer.name, "Kamala Silva");
}

#[tokio::test]
async fn test_register_customer_invalid_email() {
    let (server, _) = create_test_app();

    let payload = json!({
        "id": "C002",
        "name": "Kamala Silva",
        "contact_number": "0771234567",
        "email": "not-an-email"
    });
    let response = as_admin(server.post("/api/customers")).json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_customer_rejects_comma_in_name() {
    let (server, store) = create_test_app();

    let payload = json!({
        "id": "C002",
        "name": "Silva, Kamala",
        "contact_number": "0771234567",
        "email": "kamala@example.com"
    });
    let response = as_admin(server.post("/api/customers")).json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert!(store.snapshot().customer("C002").is_none());
}

#[tokio::test]
async fn test_customer_cannot_read_another_customer() {
    let (server, _) = create_test_app();

    let response = as_customer(server.get("/api/customers/C001"), "C002").await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Booking Tests
// ============================================================================

#[tokio::test]
async fn test_create_booking_reserves_vehicle() {
    let (server, store) = create_test_app();

    let booking = create_booking(&server, "B001").await;
    assert_eq!(booking.customer_id, "C001");
    assert_eq!(booking.state, BookingState::Active);
    assert_eq!(booking.deposit, dec!(5000));

    let vehicle: Vehicle = server.get("/api/vehicles/V001").await.json();
    assert!(!vehicle.is_available());
    assert!(store.snapshot().booking("B001").is_some());
}

#[tokio::test]
async fn test_create_booking_generates_id() {
    let (server, _) = create_test_app();

    let payload = json!({
        "vehicle_id": "V002",
        "start_date": "2025-03-10",
        "end_date": "2025-03-11"
    });
    let response = as_customer(server.post("/api/bookings"), "C001")
        .json(&payload)
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let booking: Booking = response.json();
    assert!(booking.id.starts_with('B'));
    assert_eq!(booking.id.len(), 9);
}

#[tokio::test]
async fn test_create_booking_short_notice() {
    let (server, _) = create_test_app();

    let response = as_customer(server.post("/api/bookings"), "C001")
        .json(&booking_payload("B001", "V001", "2025-03-02", "2025-03-04"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_create_booking_on_reserved_vehicle() {
    let (server, _) = create_test_app();
    create_booking(&server, "B001").await;

    let response = as_customer(server.post("/api/bookings"), "C001")
        .json(&booking_payload("B002", "V001", "2025-04-01", "2025-04-02"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_booking_for_another_customer_is_forbidden() {
    let (server, _) = create_test_app();

    let mut payload = booking_payload("B001", "V001", "2025-03-10", "2025-03-12");
    payload["customer_id"] = json!("C001");
    let response = as_customer(server.post("/api/bookings"), "C002")
        .json(&payload)
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_booking_releases_vehicle() {
    let (server, _) = create_test_app();
    create_booking(&server, "B001").await;

    let response = as_customer(server.post("/api/bookings/B001/cancel"), "C001").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let booking: Booking = response.json();
    assert_eq!(booking.state, BookingState::Cancelled);

    let vehicle: Vehicle = server.get("/api/vehicles/V001").await.json();
    assert!(vehicle.is_available());

    // A second cancel is an invalid transition
    let response = as_customer(server.post("/api/bookings/B001/cancel"), "C001").await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_booking() {
    let (server, _) = create_test_app();
    create_booking(&server, "B001").await;

    let response = as_customer(server.delete("/api/bookings/B001"), "C001").await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = as_admin(server.get("/api/bookings/B001")).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_bookings_requires_admin_without_filter() {
    let (server, _) = create_test_app();
    create_booking(&server, "B001").await;

    let response = as_customer(server.get("/api/bookings"), "C001").await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = as_customer(server.get("/api/bookings"), "C001")
        .add_query_param("customer_id", "C001")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let bookings: Vec<Booking> = response.json();
    assert_eq!(bookings.len(), 1);

    let response = as_admin(server.get("/api/bookings")).await;
    let bookings: Vec<Booking> = response.json();
    assert_eq!(bookings.len(), 1);
}

#[tokio::test]
async fn test_my_bookings() {
    let (server, _) = create_test_app();
    create_booking(&server, "B001").await;

    let mine: Vec<Booking> = as_customer(server.get("/api/bookings/mine"), "C001")
        .await
        .json();
    assert_eq!(mine.len(), 1);

    let others: Vec<Booking> = as_customer(server.get("/api/bookings/mine"), "C002")
        .await
        .json();
    assert!(others.is_empty());
}

// ============================================================================
// Fee Tests
// ============================================================================

#[tokio::test]
async fn test_booking_charge_with_actual_distance() {
    let (server, _) = create_test_app();
    create_booking(&server, "B001").await;

    // Hybrid, 3 days, 450 km free, 150 km extra at 60
    let response = as_customer(server.get("/api/bookings/B001/charge"), "C001")
        .add_query_param("actual_distance", 600)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let charge: ChargeBreakdown = response.json();
    assert_eq!(charge.days, 3);
    assert_eq!(charge.base_price, dec!(22500));
    assert_eq!(charge.extra_distance, 150);
    assert_eq!(charge.extra_distance_charge, dec!(9000));
    assert_eq!(charge.tax, dec!(3780));
    assert_eq!(charge.total, dec!(40280));
}

#[tokio::test]
async fn test_booking_charge_forbidden_for_other_customer() {
    let (server, _) = create_test_app();
    create_booking(&server, "B001").await;

    let response = as_customer(server.get("/api/bookings/B001/charge"), "C002").await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_pricing_quote() {
    let (server, _) = create_test_app();

    let response = server
        .get("/api/pricing/quote")
        .add_query_param("category", "Electric")
        .add_query_param("start_date", "2025-03-10")
        .add_query_param("end_date", "2025-03-16")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let charge: ChargeBreakdown = response.json();
    assert_eq!(charge.days, 7);
    assert_eq!(charge.base_price, dec!(70000));
    assert_eq!(charge.discount, dec!(7000));
}

#[tokio::test]
async fn test_pricing_quote_unknown_category() {
    let (server, _) = create_test_app();

    let response = server
        .get("/api/pricing/quote")
        .add_query_param("category", "Spaceship")
        .add_query_param("start_date", "2025-03-10")
        .add_query_param("end_date", "2025-03-16")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Report Tests
// ============================================================================

#[tokio::test]
async fn test_reminders_for_tomorrow() {
    let mut pickup = Booking::new(
        "B001",
        "C001",
        "V001",
        NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
        0,
    );
    pickup.activate().unwrap();
    let catalog = Catalog::from_parts(
        Vehicle::samples(),
        vec![Customer::new("C001", "Nimal Perera", "0771234567", "nimal@example.com")],
        vec![pickup],
    );
    let services = EngineServices {
        clock: Arc::new(FixedClock(today())),
        ..EngineServices::default()
    };
    let system = RentalSystem::load(Box::new(MemoryStore::with_catalog(catalog)), services).unwrap();
    let server = TestServer::new(create_router(AppState::new(system))).unwrap();

    let response = as_admin(server.get("/api/reports/reminders")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["kind"], "pickup");
    assert_eq!(body[0]["booking_id"], "B001");
    assert_eq!(body[0]["date"], "2025-03-02");

    let response = as_customer(server.get("/api/reports/reminders"), "C001").await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Health Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_healthy() {
    let (server, _) = create_test_app();

    let response = server.get("/api/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_save_failure_makes_health_critical() {
    let (server, store) = create_test_app();
    store.fail_saves(true);

    let response = as_customer(server.post("/api/bookings"), "C001")
        .json(&booking_payload("B001", "V001", "2025-03-10", "2025-03-12"))
        .await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "INTERNAL_ERROR");

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "critical");
}

// ============================================================================
// Error Response Format Tests
// ============================================================================

#[tokio::test]
async fn test_error_response_format() {
    let (server, _) = create_test_app();

    let response = server.get("/api/vehicles/V999").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();

    assert_eq!(body["error_code"], "NOT_FOUND");
    assert!(body["message"].as_str().unwrap().contains("V999"));
    assert!(body["timestamp"].is_string());
}
