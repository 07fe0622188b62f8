// HTTP handlers for vehicle, customer and booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::business_rules::pricing::{ChargeBreakdown, Invoice};
use crate::business_rules::search::{BestMatch, Recommendation};
use crate::error::ApiError;
use crate::query::{
    BestMatchParams, BookingListFilter, BookingListParams, BookingSearchParams, ChargeParams,
    QueryValidator, VehicleSearchParams,
};
use crate::rental::{
    Booking, CallerIdentity, CreateBookingRequest, CreateCustomerRequest, CreateVehicleRequest,
    Customer, NewBooking, RentalSystem, UpdateBookingRequest, UpdateCustomerRequest,
    UpdateVehicleRequest, Vehicle,
};
use crate::AppState;

/// Short uppercase id such as "B1A2B3C4D"
fn generate_booking_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("B{}", raw[..8].to_uppercase())
}

// ============================================================================
// Vehicles
// ============================================================================

/// Handler for GET /api/vehicles
#[utoipa::path(
    get,
    path = "/api/vehicles",
    responses((status = 200, description = "All vehicles", body = Vec<Vehicle>)),
    tag = "vehicles"
)]
pub async fn list_vehicles(State(state): State<AppState>) -> Result<Json<Vec<Vehicle>>, ApiError> {
    let system = state.system.lock().await;
    tracing::debug!("Listing {} vehicles", system.list_vehicles().len());
    Ok(Json(system.list_vehicles().to_vec()))
}

/// Handler for POST /api/vehicles
#[utoipa::path(
    post,
    path = "/api/vehicles",
    request_body = CreateVehicleRequest,
    responses(
        (status = 201, description = "Vehicle added", body = Vehicle),
        (status = 400, description = "Invalid input data"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 409, description = "Vehicle id already exists")
    ),
    tag = "vehicles"
)]
pub async fn create_vehicle(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(payload): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
    payload.validate()?;

    let mut system = state.system.lock().await;
    let vehicle = system.add_vehicle(&caller, payload.into())?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// Handler for GET /api/vehicles/:id
#[utoipa::path(
    get,
    path = "/api/vehicles/{id}",
    params(("id" = String, Path, description = "Vehicle id")),
    responses(
        (status = 200, description = "Vehicle found", body = Vehicle),
        (status = 404, description = "Vehicle not found")
    ),
    tag = "vehicles"
)]
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vehicle>, ApiError> {
    let system = state.system.lock().await;
    Ok(Json(system.vehicle(&id)?.clone()))
}

/// Handler for PUT /api/vehicles/:id
#[utoipa::path(
    put,
    path = "/api/vehicles/{id}",
    params(("id" = String, Path, description = "Vehicle id")),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, description = "Vehicle updated", body = Vehicle),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle has active bookings")
    ),
    tag = "vehicles"
)]
pub async fn update_vehicle(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    Json(payload): Json<UpdateVehicleRequest>,
) -> Result<Json<Vehicle>, ApiError> {
    payload.validate()?;

    let mut system = state.system.lock().await;
    Ok(Json(system.update_vehicle(&caller, &id, payload)?))
}

/// Handler for DELETE /api/vehicles/:id
#[utoipa::path(
    delete,
    path = "/api/vehicles/{id}",
    params(("id" = String, Path, description = "Vehicle id")),
    responses(
        (status = 204, description = "Vehicle deleted"),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle has active bookings")
    ),
    tag = "vehicles"
)]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut system = state.system.lock().await;
    system.delete_vehicle(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/vehicles/search
#[utoipa::path(
    get,
    path = "/api/vehicles/search",
    params(VehicleSearchParams),
    responses(
        (status = 200, description = "Vehicles matching every given filter", body = Vec<Vehicle>),
        (status = 400, description = "Invalid query parameter")
    ),
    tag = "search"
)]
pub async fn search_vehicles(
    State(state): State<AppState>,
    Query(params): Query<VehicleSearchParams>,
) -> Result<Json<Vec<Vehicle>>, ApiError> {
    let criteria = QueryValidator::vehicle_search(params)?;

    let system = state.system.lock().await;
    let vehicles = system.search_vehicles(&criteria);
    tracing::debug!("Vehicle search returned {} results", vehicles.len());
    Ok(Json(vehicles))
}

/// Handler for GET /api/vehicles/best-matches
#[utoipa::path(
    get,
    path = "/api/vehicles/best-matches",
    params(BestMatchParams),
    responses(
        (status = 200, description = "Vehicles within budget, preferred category first", body = Vec<BestMatch>),
        (status = 400, description = "Invalid query parameter")
    ),
    tag = "search"
)]
pub async fn best_matches(
    State(state): State<AppState>,
    Query(params): Query<BestMatchParams>,
) -> Result<Json<Vec<BestMatch>>, ApiError> {
    let query = QueryValidator::best_match(params)?;

    let system = state.system.lock().await;
    Ok(Json(system.find_best_matches(
        query.start,
        query.end,
        query.max_budget,
        query.preferred_category,
    )))
}

// ============================================================================
// Customers
// ============================================================================

/// Handler for GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    responses(
        (status = 200, description = "All customers", body = Vec<Customer>),
        (status = 403, description = "Caller is not an administrator")
    ),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<Customer>>, ApiError> {
    RentalSystem::require_administrator(&caller, "Listing customers")?;

    let system = state.system.lock().await;
    Ok(Json(system.list_customers().to_vec()))
}

/// Handler for POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer registered", body = Customer),
        (status = 400, description = "Invalid input data"),
        (status = 409, description = "Customer id already exists")
    ),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    payload.validate()?;

    let mut system = state.system.lock().await;
    let customer = system.register_customer(&caller, payload.into())?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Handler for GET /api/customers/:id
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = String, Path, description = "National ID or passport number")),
    responses(
        (status = 200, description = "Customer found", body = Customer),
        (status = 404, description = "Customer not found")
    ),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    RentalSystem::require_access(&caller, &id)?;

    let system = state.system.lock().await;
    Ok(Json(system.customer(&id)?.clone()))
}

/// Handler for PUT /api/customers/:id
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    params(("id" = String, Path, description = "National ID or passport number")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 404, description = "Customer not found")
    ),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    payload.validate()?;

    let mut system = state.system.lock().await;
    Ok(Json(system.update_customer(&caller, &id, payload)?))
}

/// Handler for DELETE /api/customers/:id
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(("id" = String, Path, description = "National ID or passport number")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer has active bookings")
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut system = state.system.lock().await;
    system.delete_customer(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/customers/:id/recommendations
#[utoipa::path(
    get,
    path = "/api/customers/{id}/recommendations",
    params(("id" = String, Path, description = "National ID or passport number")),
    responses(
        (status = 200, description = "Suggested vehicles", body = Recommendation),
        (status = 404, description = "Customer not found")
    ),
    tag = "search"
)]
pub async fn recommendations(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Recommendation>, ApiError> {
    let system = state.system.lock().await;
    Ok(Json(system.recommend(&caller, &id)?))
}

// ============================================================================
// Bookings
// ============================================================================

/// Handler for GET /api/bookings
///
/// Without filters this lists every booking and is restricted to
/// administrators. A customer may filter by their own `customer_id`.
#[utoipa::path(
    get,
    path = "/api/bookings",
    params(BookingListParams),
    responses(
        (status = 200, description = "Bookings", body = Vec<Booking>),
        (status = 400, description = "More than one filter given")
    ),
    tag = "bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(params): Query<BookingListParams>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let filter = QueryValidator::booking_list(params)?;

    let system = state.system.lock().await;
    let bookings: Vec<Booking> = match filter {
        BookingListFilter::Customer(customer_id) => {
            RentalSystem::require_access(&caller, &customer_id)?;
            system
                .bookings_for_customer(&customer_id)?
                .into_iter()
                .cloned()
                .collect()
        }
        BookingListFilter::All => {
            RentalSystem::require_administrator(&caller, "Listing all bookings")?;
            system.list_bookings().to_vec()
        }
        BookingListFilter::CustomerName(name) => {
            RentalSystem::require_administrator(&caller, "Listing bookings by name")?;
            system.bookings_by_customer_name(&name).into_iter().cloned().collect()
        }
        BookingListFilter::Date(date) => {
            RentalSystem::require_administrator(&caller, "Listing bookings by date")?;
            system.bookings_on(date).into_iter().cloned().collect()
        }
    };

    Ok(Json(bookings))
}

/// Handler for POST /api/bookings
#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created and vehicle reserved", body = Booking),
        (status = 400, description = "Booking rule violated"),
        (status = 404, description = "Customer or vehicle not found"),
        (status = 409, description = "Booking id already exists")
    ),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    payload.validate()?;

    let customer_id = payload
        .customer_id
        .or_else(|| caller.customer_id.clone())
        .ok_or_else(|| ApiError::BadRequest("customer_id is required".to_string()))?;

    let request = NewBooking {
        id: payload.booking_id.unwrap_or_else(generate_booking_id),
        customer_id,
        vehicle_id: payload.vehicle_id,
        start_date: payload.start_date,
        end_date: payload.end_date,
        total_distance: payload.total_distance,
    };

    let mut system = state.system.lock().await;
    let booking = system.create_booking(&caller, request)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Handler for GET /api/bookings/search
#[utoipa::path(
    get,
    path = "/api/bookings/search",
    params(BookingSearchParams),
    responses(
        (status = 200, description = "Bookings matching every given filter", body = Vec<Booking>),
        (status = 400, description = "Invalid query parameter")
    ),
    tag = "search"
)]
pub async fn search_bookings(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(params): Query<BookingSearchParams>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let criteria = QueryValidator::booking_search(params)?;

    let system = state.system.lock().await;
    Ok(Json(system.search_bookings(&caller, &criteria)))
}

/// Handler for GET /api/bookings/mine
#[utoipa::path(
    get,
    path = "/api/bookings/mine",
    responses((status = 200, description = "Bookings of the calling customer", body = Vec<Booking>)),
    tag = "bookings"
)]
pub async fn my_bookings(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let system = state.system.lock().await;
    Ok(Json(system.my_bookings(&caller).into_iter().cloned().collect()))
}

/// Handler for GET /api/bookings/:id
#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking found", body = Booking),
        (status = 403, description = "Booking belongs to another customer"),
        (status = 404, description = "Booking not found")
    ),
    tag = "bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    let system = state.system.lock().await;
    Ok(Json(system.booking_for(&caller, &id)?.clone()))
}

/// Handler for PUT /api/bookings/:id
#[utoipa::path(
    put,
    path = "/api/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Booking updated", body = Booking),
        (status = 400, description = "Booking rule violated or change window closed"),
        (status = 404, description = "Booking not found")
    ),
    tag = "bookings"
)]
pub async fn update_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<Json<Booking>, ApiError> {
    payload.validate()?;

    let mut system = state.system.lock().await;
    Ok(Json(system.update_booking(&caller, &id, payload)?))
}

/// Handler for DELETE /api/bookings/:id
#[utoipa::path(
    delete,
    path = "/api/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 204, description = "Booking removed"),
        (status = 400, description = "Change window closed"),
        (status = 404, description = "Booking not found")
    ),
    tag = "bookings"
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut system = state.system.lock().await;
    system.delete_booking(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /api/bookings/:id/cancel
#[utoipa::path(
    post,
    path = "/api/bookings/{id}/cancel",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 400, description = "Change window closed"),
        (status = 409, description = "Booking is not active")
    ),
    tag = "bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    let mut system = state.system.lock().await;
    Ok(Json(system.cancel_booking(&caller, &id)?))
}

/// Handler for POST /api/bookings/:id/complete
#[utoipa::path(
    post,
    path = "/api/bookings/{id}/complete",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking completed", body = Booking),
        (status = 403, description = "Caller is not an administrator"),
        (status = 409, description = "Booking is not active")
    ),
    tag = "bookings"
)]
pub async fn complete_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    let mut system = state.system.lock().await;
    Ok(Json(system.complete_booking(&caller, &id)?))
}

/// Handler for GET /api/bookings/:id/charge
#[utoipa::path(
    get,
    path = "/api/bookings/{id}/charge",
    params(("id" = String, Path, description = "Booking id"), ChargeParams),
    responses(
        (status = 200, description = "Fee breakdown", body = ChargeBreakdown),
        (status = 404, description = "Booking not found")
    ),
    tag = "bookings"
)]
pub async fn booking_charge(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    Query(params): Query<ChargeParams>,
) -> Result<Json<ChargeBreakdown>, ApiError> {
    let system = state.system.lock().await;
    let charge = match params.actual_distance {
        Some(distance) => system.compute_charge(&caller, &id, distance)?,
        None => system.estimate_charge(&caller, &id)?,
    };
    Ok(Json(charge))
}

/// Handler for GET /api/bookings/:id/invoice
#[utoipa::path(
    get,
    path = "/api/bookings/{id}/invoice",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Invoice at the declared distance", body = Invoice),
        (status = 404, description = "Booking not found")
    ),
    tag = "bookings"
)]
pub async fn booking_invoice(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, ApiError> {
    let system = state.system.lock().await;
    Ok(Json(system.invoice(&caller, &id)?))
}
