use crate::business_rules::types::{VehicleCategory, VehicleStatus};
use crate::business_rules::pricing::security_deposit;
use crate::rental::error::RentalError;
use crate::rental::status_machine::BookingStateMachine;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Number of rental days in an inclusive range, 0 when the range is inverted
pub fn rental_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if start > end {
        0
    } else {
        (end - start).num_days() + 1
    }
}

/// Booking lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingState {
    Proposed,
    Active,
    Cancelled,
    Completed,
}

impl BookingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Proposed => "proposed",
            BookingState::Active => "active",
            BookingState::Cancelled => "cancelled",
            BookingState::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "proposed" => Ok(BookingState::Proposed),
            "active" => Ok(BookingState::Active),
            "cancelled" | "canceled" => Ok(BookingState::Cancelled),
            "completed" => Ok(BookingState::Completed),
            _ => Err(format!("Invalid booking state: {}", s)),
        }
    }
}

impl Default for BookingState {
    fn default() -> Self {
        BookingState::Proposed
    }
}

impl std::fmt::Display for BookingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rentable vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vehicle {
    pub id: String,
    pub model: String,
    pub category: VehicleCategory,
    pub daily_rate: Decimal,
    pub status: VehicleStatus,
}

impl Vehicle {
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        category: VehicleCategory,
        daily_rate: Decimal,
        status: VehicleStatus,
    ) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            category,
            daily_rate,
            status,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    /// Vehicles loaded into an empty catalog on first start
    pub fn samples() -> Vec<Vehicle> {
        vec![
            Vehicle::new(
                "V001",
                "Toyota Aqua",
                VehicleCategory::Hybrid,
                Decimal::from(7500),
                VehicleStatus::Available,
            ),
            Vehicle::new(
                "V002",
                "Nissan Leaf",
                VehicleCategory::Electric,
                Decimal::from(10000),
                VehicleStatus::Available,
            ),
            Vehicle::new(
                "V003",
                "BMW X5",
                VehicleCategory::LuxurySuv,
                Decimal::from(15000),
                VehicleStatus::Available,
            ),
        ]
    }
}

/// A registered customer, keyed by national ID or passport number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub contact_number: String,
    pub email: String,
}

impl Customer {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        contact_number: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            contact_number: contact_number.into(),
            email: email.into(),
        }
    }
}

/// A reservation of one vehicle by one customer for an inclusive date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: String,
    pub customer_id: String,
    pub vehicle_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Declared distance in kilometres
    pub total_distance: u32,
    pub deposit: Decimal,
    pub state: BookingState,
}

impl Booking {
    /// New booking in the `Proposed` state
    pub fn new(
        id: impl Into<String>,
        customer_id: impl Into<String>,
        vehicle_id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_distance: u32,
    ) -> Self {
        Self {
            id: id.into(),
            customer_id: customer_id.into(),
            vehicle_id: vehicle_id.into(),
            start_date,
            end_date,
            total_distance,
            deposit: security_deposit(),
            state: BookingState::Proposed,
        }
    }

    pub fn duration_in_days(&self) -> i64 {
        rental_days(self.start_date, self.end_date)
    }

    /// Days from `today` until the start date, -1 once the rental has started
    pub fn days_until_start(&self, today: NaiveDate) -> i64 {
        if self.start_date <= today {
            -1
        } else {
            (self.start_date - today).num_days()
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == BookingState::Active
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    fn transition(&mut self, to: BookingState) -> Result<(), RentalError> {
        self.state = BookingStateMachine::transition(self.state, to)
            .map_err(RentalError::InvalidTransition)?;
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), RentalError> {
        self.transition(BookingState::Active)
    }

    pub fn cancel(&mut self) -> Result<(), RentalError> {
        self.transition(BookingState::Cancelled)
    }

    pub fn complete(&mut self) -> Result<(), RentalError> {
        self.transition(BookingState::Completed)
    }
}

/// Request DTO for adding a vehicle
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 32, message = "Vehicle id must be 1-32 characters"), custom = "crate::validation::validate_no_delimiter")]
    pub id: String,
    #[validate(length(min = 1, max = 100, message = "Model must be 1-100 characters"), custom = "crate::validation::validate_no_delimiter")]
    pub model: String,
    pub category: VehicleCategory,
    #[validate(custom = "crate::validation::validate_daily_rate")]
    pub daily_rate: Decimal,
    #[serde(default)]
    pub status: Option<VehicleStatus>,
}

impl From<CreateVehicleRequest> for Vehicle {
    fn from(request: CreateVehicleRequest) -> Self {
        Vehicle::new(
            request.id,
            request.model,
            request.category,
            request.daily_rate,
            request.status.unwrap_or_default(),
        )
    }
}

/// Request DTO for updating a vehicle; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 100, message = "Model must be 1-100 characters"), custom = "crate::validation::validate_no_delimiter")]
    pub model: Option<String>,
    pub category: Option<VehicleCategory>,
    #[validate(custom = "crate::validation::validate_daily_rate")]
    pub daily_rate: Option<Decimal>,
    pub status: Option<VehicleStatus>,
}

/// Request DTO for registering a customer
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 32, message = "Customer id must be 1-32 characters"), custom = "crate::validation::validate_no_delimiter")]
    pub id: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"), custom = "crate::validation::validate_no_delimiter")]
    pub name: String,
    #[validate(custom = "crate::validation::validate_contact_number")]
    pub contact_number: String,
    #[validate(email(message = "Email must be a valid address"), custom = "crate::validation::validate_no_delimiter")]
    pub email: String,
}

impl From<CreateCustomerRequest> for Customer {
    fn from(request: CreateCustomerRequest) -> Self {
        Customer::new(request.id, request.name, request.contact_number, request.email)
    }
}

/// Request DTO for updating a customer; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"), custom = "crate::validation::validate_no_delimiter")]
    pub name: Option<String>,
    #[validate(custom = "crate::validation::validate_contact_number")]
    pub contact_number: Option<String>,
    #[validate(email(message = "Email must be a valid address"), custom = "crate::validation::validate_no_delimiter")]
    pub email: Option<String>,
}

/// Request DTO for creating a booking
///
/// `booking_id` is generated when omitted. `customer_id` defaults to the
/// caller's own customer key.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 32, message = "Booking id must be 1-32 characters"), custom = "crate::validation::validate_no_delimiter")]
    pub booking_id: Option<String>,
    #[validate(custom = "crate::validation::validate_no_delimiter")]
    pub customer_id: Option<String>,
    #[validate(length(min = 1, message = "Vehicle id is required"), custom = "crate::validation::validate_no_delimiter")]
    pub vehicle_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub total_distance: u32,
}

/// Fields of a booking that may change through an update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateBookingRequest {
    #[validate(length(min = 1, message = "Vehicle id must not be empty"), custom = "crate::validation::validate_no_delimiter")]
    pub vehicle_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_distance: Option<u32>,
}
