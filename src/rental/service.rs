use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::business_rules::{
    audit::{AuditAction, AuditEvent, AuditSink, TracingAuditSink},
    availability::{within_change_window, AvailabilityEngine, CHANGE_NOTICE_DAYS},
    metrics::{OperationType, PerformanceMetrics},
    pricing::{ChargeBreakdown, FeeCalculator, Invoice, PricingTable},
    search::{BestMatch, BookingSearchCriteria, Recommendation, SearchEngine, VehicleSearchCriteria},
    types::{VehicleCategory, VehicleStatus},
};
use crate::clock::{Clock, SystemClock};
use crate::rental::error::{RentalError, RentalResult};
use crate::rental::identity::CallerIdentity;
use crate::rental::models::{
    Booking, Customer, UpdateBookingRequest, UpdateCustomerRequest, UpdateVehicleRequest, Vehicle,
};
use crate::rental::repository::Catalog;
use crate::rental::status_machine::BookingStateMachine;
use crate::storage::CatalogStore;

/// Everything needed to create a booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub id: String,
    pub customer_id: String,
    pub vehicle_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_distance: u32,
}

/// Collaborators injected into the rental system
pub struct EngineServices {
    pub pricing: PricingTable,
    pub audit: Arc<dyn AuditSink>,
    pub clock: Arc<dyn Clock>,
    pub metrics: PerformanceMetrics,
}

impl Default for EngineServices {
    fn default() -> Self {
        Self {
            pricing: PricingTable::default(),
            audit: Arc::new(TracingAuditSink),
            clock: Arc::new(SystemClock),
            metrics: PerformanceMetrics::new(),
        }
    }
}

/// Booking engine and catalog owner
///
/// Every mutation validates, applies the change in memory, records an audit
/// event and then asks the store to save the whole catalog. A failed save is
/// reported as `RentalError::Storage` but the in-memory change stands.
pub struct RentalSystem {
    catalog: Catalog,
    store: Box<dyn CatalogStore>,
    fees: FeeCalculator,
    availability: AvailabilityEngine,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    metrics: PerformanceMetrics,
    last_save_error: Option<String>,
    skipped_records: usize,
}

impl RentalSystem {
    pub fn new(catalog: Catalog, store: Box<dyn CatalogStore>, services: EngineServices) -> Self {
        Self {
            catalog,
            store,
            fees: FeeCalculator::new(services.pricing),
            availability: AvailabilityEngine::new(),
            audit: services.audit,
            clock: services.clock,
            metrics: services.metrics,
            last_save_error: None,
            skipped_records: 0,
        }
    }

    /// Build the system from whatever the store currently holds
    pub fn load(store: Box<dyn CatalogStore>, services: EngineServices) -> RentalResult<Self> {
        let outcome = store.load()?;
        let skipped = outcome.skipped.len();

        let mut system = Self::new(outcome.catalog, store, services);
        system.skipped_records = skipped;
        Ok(system)
    }

    /// Add the sample fleet when the catalog has no vehicles; returns whether it did
    pub fn seed_sample_vehicles(&mut self) -> RentalResult<bool> {
        if !self.catalog.vehicles().is_empty() {
            return Ok(false);
        }

        for vehicle in Vehicle::samples() {
            info!("Seeding sample vehicle {} ({})", vehicle.id, vehicle.model);
            self.catalog.push_vehicle(vehicle);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn fees(&self) -> &FeeCalculator {
        &self.fees
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Records dropped while loading
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    fn persist(&mut self) -> RentalResult<()> {
        match self.store.save(&self.catalog) {
            Ok(()) => {
                self.last_save_error = None;
                Ok(())
            }
            Err(e) => {
                error!("Failed to save catalog: {}", e);
                self.last_save_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    fn record(&self, action: AuditAction, actor: &CallerIdentity, subject: &str, details: serde_json::Value) {
        self.audit
            .record(AuditEvent::new(action, actor.username.clone(), subject, details));
    }

    pub fn require_administrator(actor: &CallerIdentity, operation: &str) -> RentalResult<()> {
        if actor.is_administrator() {
            Ok(())
        } else {
            Err(RentalError::Forbidden(format!(
                "{} requires an administrator",
                operation
            )))
        }
    }

    pub fn require_access(actor: &CallerIdentity, customer_id: &str) -> RentalResult<()> {
        if actor.can_act_for(customer_id) {
            Ok(())
        } else {
            Err(RentalError::Forbidden(format!(
                "{} may not act for customer {}",
                actor.username, customer_id
            )))
        }
    }

    /// Status the vehicle would have if booking `exclude_id` did not exist
    fn effective_status(&self, vehicle: &Vehicle, exclude_id: Option<&str>) -> VehicleStatus {
        if vehicle.status == VehicleStatus::Reserved
            && self
                .catalog
                .active_bookings_on(&vehicle.id, exclude_id)
                .next()
                .is_none()
        {
            VehicleStatus::Available
        } else {
            vehicle.status
        }
    }

    /// Back to Available once no active booking holds the vehicle
    fn release_vehicle(&mut self, vehicle_id: &str) {
        if self.catalog.active_bookings_on(vehicle_id, None).next().is_some() {
            return;
        }
        if let Some(vehicle) = self.catalog.vehicle_mut(vehicle_id) {
            if vehicle.status == VehicleStatus::Reserved {
                vehicle.status = VehicleStatus::Available;
                debug!("Vehicle {} released", vehicle_id);
            }
        }
    }

    fn reserve_vehicle(&mut self, vehicle_id: &str) {
        if let Some(vehicle) = self.catalog.vehicle_mut(vehicle_id) {
            vehicle.status = VehicleStatus::Reserved;
        }
    }

    // ===== Vehicles =====

    pub fn list_vehicles(&self) -> &[Vehicle] {
        self.catalog.vehicles()
    }

    pub fn vehicle(&self, id: &str) -> RentalResult<&Vehicle> {
        self.catalog
            .vehicle(id)
            .ok_or_else(|| RentalError::VehicleNotFound(id.to_string()))
    }

    pub fn add_vehicle(&mut self, actor: &CallerIdentity, vehicle: Vehicle) -> RentalResult<Vehicle> {
        Self::require_administrator(actor, "Adding vehicles")?;

        if vehicle.daily_rate.is_sign_negative() {
            return Err(RentalError::ValidationError(
                "daily rate must not be negative".to_string(),
            ));
        }
        if vehicle.status == VehicleStatus::Reserved {
            return Err(RentalError::ValidationError(
                "new vehicles cannot start out reserved".to_string(),
            ));
        }
        if self.catalog.vehicle(&vehicle.id).is_some() {
            return Err(RentalError::Conflict(format!(
                "vehicle {} already exists",
                vehicle.id
            )));
        }

        self.catalog.push_vehicle(vehicle.clone());
        info!("Vehicle {} added ({})", vehicle.id, vehicle.model);
        self.record(
            AuditAction::VehicleAdded,
            actor,
            &vehicle.id,
            json!({ "model": vehicle.model, "category": vehicle.category, "daily_rate": vehicle.daily_rate }),
        );
        self.persist()?;
        Ok(vehicle)
    }

    /// Change model, category, rate or status
    ///
    /// `Reserved` belongs to the booking engine: it cannot be set by hand, and
    /// a vehicle held by an active booking cannot change status.
    pub fn update_vehicle(
        &mut self,
        actor: &CallerIdentity,
        id: &str,
        changes: UpdateVehicleRequest,
    ) -> RentalResult<Vehicle> {
        Self::require_administrator(actor, "Updating vehicles")?;

        let mut vehicle = self.vehicle(id)?.clone();

        if let Some(status) = changes.status {
            if status != vehicle.status {
                if status == VehicleStatus::Reserved {
                    return Err(RentalError::ValidationError(
                        "vehicles are reserved through bookings".to_string(),
                    ));
                }
                if self.catalog.active_bookings_on(id, None).next().is_some() {
                    return Err(RentalError::Conflict(format!(
                        "vehicle {} has active bookings",
                        id
                    )));
                }
                vehicle.status = status;
            }
        }
        if let Some(rate) = changes.daily_rate {
            if rate.is_sign_negative() {
                return Err(RentalError::ValidationError(
                    "daily rate must not be negative".to_string(),
                ));
            }
            vehicle.daily_rate = rate;
        }
        if let Some(model) = changes.model {
            vehicle.model = model;
        }
        if let Some(category) = changes.category {
            vehicle.category = category;
        }

        if let Some(stored) = self.catalog.vehicle_mut(id) {
            *stored = vehicle.clone();
        }
        info!("Vehicle {} updated", id);
        self.record(
            AuditAction::VehicleUpdated,
            actor,
            id,
            json!({ "status": vehicle.status, "daily_rate": vehicle.daily_rate }),
        );
        self.persist()?;
        Ok(vehicle)
    }

    pub fn delete_vehicle(&mut self, actor: &CallerIdentity, id: &str) -> RentalResult<Vehicle> {
        Self::require_administrator(actor, "Deleting vehicles")?;
        self.vehicle(id)?;

        if self.catalog.active_bookings_on(id, None).next().is_some() {
            return Err(RentalError::Conflict(format!(
                "vehicle {} is referenced by an active booking",
                id
            )));
        }

        let removed = self
            .catalog
            .remove_vehicle(id)
            .ok_or_else(|| RentalError::VehicleNotFound(id.to_string()))?;
        info!("Vehicle {} deleted", id);
        self.record(AuditAction::VehicleDeleted, actor, id, json!({ "model": removed.model }));
        self.persist()?;
        Ok(removed)
    }

    // ===== Customers =====

    pub fn list_customers(&self) -> &[Customer] {
        self.catalog.customers()
    }

    pub fn customer(&self, id: &str) -> RentalResult<&Customer> {
        self.catalog
            .customer(id)
            .ok_or_else(|| RentalError::CustomerNotFound(id.to_string()))
    }

    pub fn register_customer(
        &mut self,
        actor: &CallerIdentity,
        customer: Customer,
    ) -> RentalResult<Customer> {
        Self::require_access(actor, &customer.id)?;

        if self.catalog.customer(&customer.id).is_some() {
            return Err(RentalError::Conflict(format!(
                "customer {} already exists",
                customer.id
            )));
        }

        self.catalog.push_customer(customer.clone());
        info!("Customer {} registered", customer.id);
        self.record(
            AuditAction::CustomerRegistered,
            actor,
            &customer.id,
            json!({ "name": customer.name }),
        );
        self.persist()?;
        Ok(customer)
    }

    pub fn update_customer(
        &mut self,
        actor: &CallerIdentity,
        id: &str,
        changes: UpdateCustomerRequest,
    ) -> RentalResult<Customer> {
        Self::require_access(actor, id)?;

        let mut customer = self.customer(id)?.clone();
        if let Some(name) = changes.name {
            customer.name = name;
        }
        if let Some(contact_number) = changes.contact_number {
            customer.contact_number = contact_number;
        }
        if let Some(email) = changes.email {
            customer.email = email;
        }

        if let Some(stored) = self.catalog.customer_mut(id) {
            *stored = customer.clone();
        }
        info!("Customer {} updated", id);
        self.record(AuditAction::CustomerUpdated, actor, id, json!({ "name": customer.name }));
        self.persist()?;
        Ok(customer)
    }

    pub fn delete_customer(&mut self, actor: &CallerIdentity, id: &str) -> RentalResult<Customer> {
        Self::require_access(actor, id)?;
        self.customer(id)?;

        if self.catalog.bookings_for_customer(id).any(|b| b.is_active()) {
            return Err(RentalError::Conflict(format!(
                "customer {} has active bookings",
                id
            )));
        }

        let removed = self
            .catalog
            .remove_customer(id)
            .ok_or_else(|| RentalError::CustomerNotFound(id.to_string()))?;
        info!("Customer {} deleted", id);
        self.record(AuditAction::CustomerDeleted, actor, id, json!({ "name": removed.name }));
        self.persist()?;
        Ok(removed)
    }

    // ===== Booking queries =====

    pub fn list_bookings(&self) -> &[Booking] {
        self.catalog.bookings()
    }

    pub fn booking(&self, id: &str) -> RentalResult<&Booking> {
        self.catalog
            .booking(id)
            .ok_or_else(|| RentalError::BookingNotFound(id.to_string()))
    }

    /// Booking lookup that also enforces ownership
    pub fn booking_for(&self, actor: &CallerIdentity, id: &str) -> RentalResult<&Booking> {
        let booking = self.booking(id)?;
        Self::require_access(actor, &booking.customer_id)?;
        Ok(booking)
    }

    /// Bookings whose customer name contains `name`, ignoring case
    pub fn bookings_by_customer_name(&self, name: &str) -> Vec<&Booking> {
        let needle = name.to_lowercase();
        self.catalog
            .bookings()
            .iter()
            .filter(|b| {
                self.catalog
                    .customer(&b.customer_id)
                    .map_or(false, |c| c.name.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Bookings whose range contains `date`
    pub fn bookings_on(&self, date: NaiveDate) -> Vec<&Booking> {
        self.catalog
            .bookings()
            .iter()
            .filter(|b| b.contains_date(date))
            .collect()
    }

    pub fn bookings_for_customer<'a>(&'a self, customer_id: &'a str) -> RentalResult<Vec<&'a Booking>> {
        self.customer(customer_id)?;
        Ok(self.catalog.bookings_for_customer(customer_id).collect())
    }

    /// Bookings of the caller's own customer record; empty for administrators
    pub fn my_bookings<'a>(&'a self, actor: &'a CallerIdentity) -> Vec<&'a Booking> {
        match actor.customer_id.as_deref() {
            Some(customer_id) if !actor.is_administrator() => {
                self.catalog.bookings_for_customer(customer_id).collect()
            }
            _ => Vec::new(),
        }
    }

    // ===== Booking mutations =====

    /// Validate and store a new booking, reserving its vehicle
    pub fn create_booking(&mut self, actor: &CallerIdentity, request: NewBooking) -> RentalResult<Booking> {
        Self::require_access(actor, &request.customer_id)?;

        if self.catalog.booking(&request.id).is_some() {
            return Err(RentalError::Conflict(format!(
                "booking {} already exists",
                request.id
            )));
        }
        self.customer(&request.customer_id)?;
        let vehicle_status = self.vehicle(&request.vehicle_id)?.status;

        let mut booking = Booking::new(
            request.id,
            request.customer_id,
            request.vehicle_id,
            request.start_date,
            request.end_date,
            request.total_distance,
        );

        let validation = {
            let _timer = self.metrics.start(OperationType::Availability);
            self.availability.validate_booking(
                &booking,
                vehicle_status,
                self.catalog.bookings(),
                self.today(),
            )
        };
        if !validation.is_valid {
            let reason = validation.reason();
            warn!("Booking {} rejected: {}", booking.id, reason);
            self.record(
                AuditAction::BookingRejected,
                actor,
                &booking.id,
                json!({ "vehicle_id": booking.vehicle_id, "reasons": validation.errors }),
            );
            return Err(RentalError::InvalidBooking(reason));
        }

        booking.activate()?;
        self.reserve_vehicle(&booking.vehicle_id);
        self.catalog.push_booking(booking.clone());

        info!(
            "Booking {} created for customer {} on vehicle {} ({} to {})",
            booking.id, booking.customer_id, booking.vehicle_id, booking.start_date, booking.end_date
        );
        self.record(
            AuditAction::BookingCreated,
            actor,
            &booking.id,
            json!({
                "customer_id": booking.customer_id,
                "vehicle_id": booking.vehicle_id,
                "start_date": booking.start_date,
                "end_date": booking.end_date,
            }),
        );
        self.persist()?;
        Ok(booking)
    }

    /// Active, owned by the caller, and still inside the change window
    fn changeable_booking(&self, actor: &CallerIdentity, id: &str) -> RentalResult<Booking> {
        let booking = self.booking_for(actor, id)?;

        if !within_change_window(booking.start_date, self.today()) {
            return Err(RentalError::InvalidBooking(format!(
                "booking {} starts on {} and can no longer be changed (changes close {} day before the start)",
                booking.id, booking.start_date, CHANGE_NOTICE_DAYS
            )));
        }
        Ok(booking.clone())
    }

    /// Change vehicle, dates or distance of an active booking
    ///
    /// The merged booking goes through the same validation as a new one,
    /// ignoring itself; on failure the stored booking is untouched.
    pub fn update_booking(
        &mut self,
        actor: &CallerIdentity,
        id: &str,
        changes: UpdateBookingRequest,
    ) -> RentalResult<Booking> {
        let existing = self.changeable_booking(actor, id)?;
        if BookingStateMachine::is_terminal(existing.state) {
            return Err(RentalError::InvalidBooking(format!(
                "booking {} is {} and cannot be changed",
                id, existing.state
            )));
        }

        let mut candidate = existing.clone();
        if let Some(vehicle_id) = changes.vehicle_id {
            candidate.vehicle_id = vehicle_id;
        }
        if let Some(start_date) = changes.start_date {
            candidate.start_date = start_date;
        }
        if let Some(end_date) = changes.end_date {
            candidate.end_date = end_date;
        }
        if let Some(total_distance) = changes.total_distance {
            candidate.total_distance = total_distance;
        }

        let vehicle = self.vehicle(&candidate.vehicle_id)?;
        let vehicle_status = self.effective_status(vehicle, Some(id));

        let validation = {
            let _timer = self.metrics.start(OperationType::Availability);
            self.availability.validate_booking(
                &candidate,
                vehicle_status,
                self.catalog.bookings(),
                self.today(),
            )
        };
        if !validation.is_valid {
            let reason = validation.reason();
            warn!("Update of booking {} rejected: {}", id, reason);
            self.record(
                AuditAction::BookingRejected,
                actor,
                id,
                json!({ "vehicle_id": candidate.vehicle_id, "reasons": validation.errors }),
            );
            return Err(RentalError::InvalidBooking(reason));
        }

        if let Some(stored) = self.catalog.booking_mut(id) {
            *stored = candidate.clone();
        }
        if candidate.vehicle_id != existing.vehicle_id {
            self.reserve_vehicle(&candidate.vehicle_id);
            self.release_vehicle(&existing.vehicle_id);
        }

        info!("Booking {} updated", id);
        self.record(
            AuditAction::BookingUpdated,
            actor,
            id,
            json!({
                "vehicle_id": candidate.vehicle_id,
                "start_date": candidate.start_date,
                "end_date": candidate.end_date,
                "total_distance": candidate.total_distance,
            }),
        );
        self.persist()?;
        Ok(candidate)
    }

    /// Cancel an active booking; the record is kept in the Cancelled state
    pub fn cancel_booking(&mut self, actor: &CallerIdentity, id: &str) -> RentalResult<Booking> {
        let mut booking = self.changeable_booking(actor, id)?;
        booking.cancel()?;

        if let Some(stored) = self.catalog.booking_mut(id) {
            *stored = booking.clone();
        }
        self.release_vehicle(&booking.vehicle_id);

        info!("Booking {} cancelled", id);
        self.record(
            AuditAction::BookingCancelled,
            actor,
            id,
            json!({ "vehicle_id": booking.vehicle_id }),
        );
        self.persist()?;
        Ok(booking)
    }

    /// Remove a booking entirely
    pub fn delete_booking(&mut self, actor: &CallerIdentity, id: &str) -> RentalResult<Booking> {
        self.changeable_booking(actor, id)?;

        let removed = self
            .catalog
            .remove_booking(id)
            .ok_or_else(|| RentalError::BookingNotFound(id.to_string()))?;
        self.release_vehicle(&removed.vehicle_id);

        info!("Booking {} deleted", id);
        self.record(
            AuditAction::BookingDeleted,
            actor,
            id,
            json!({ "vehicle_id": removed.vehicle_id, "state": removed.state }),
        );
        self.persist()?;
        Ok(removed)
    }

    /// Close an active booking once the rental has started
    pub fn complete_booking(&mut self, actor: &CallerIdentity, id: &str) -> RentalResult<Booking> {
        Self::require_administrator(actor, "Completing bookings")?;

        let mut booking = self.booking(id)?.clone();
        if booking.start_date > self.today() {
            return Err(RentalError::InvalidBooking(format!(
                "booking {} has not started yet",
                id
            )));
        }
        booking.complete()?;

        if let Some(stored) = self.catalog.booking_mut(id) {
            *stored = booking.clone();
        }
        self.release_vehicle(&booking.vehicle_id);

        info!("Booking {} completed", id);
        self.record(
            AuditAction::BookingCompleted,
            actor,
            id,
            json!({ "vehicle_id": booking.vehicle_id }),
        );
        self.persist()?;
        Ok(booking)
    }

    // ===== Fees =====

    fn category_of(&self, booking: &Booking) -> RentalResult<VehicleCategory> {
        Ok(self.vehicle(&booking.vehicle_id)?.category)
    }

    /// Charge for a booking given the distance actually driven
    pub fn compute_charge(
        &self,
        actor: &CallerIdentity,
        id: &str,
        actual_distance: u32,
    ) -> RentalResult<ChargeBreakdown> {
        let booking = self.booking_for(actor, id)?;
        let category = self.category_of(booking)?;

        let _timer = self.metrics.start(OperationType::FeeCalculation);
        Ok(self.fees.compute_charge(booking, category, actual_distance))
    }

    /// Charge for a booking at its declared distance
    pub fn estimate_charge(&self, actor: &CallerIdentity, id: &str) -> RentalResult<ChargeBreakdown> {
        let booking = self.booking_for(actor, id)?;
        let category = self.category_of(booking)?;

        let _timer = self.metrics.start(OperationType::FeeCalculation);
        Ok(self.fees.estimate(booking, category))
    }

    /// Price a rental that has not been booked
    pub fn quote(&self, category: VehicleCategory, days: i64, distance: u32) -> ChargeBreakdown {
        let _timer = self.metrics.start(OperationType::FeeCalculation);
        self.fees.quote(category, days, distance)
    }

    pub fn invoice(&self, actor: &CallerIdentity, id: &str) -> RentalResult<Invoice> {
        let booking = self.booking_for(actor, id)?;
        let customer = self.customer(&booking.customer_id)?;
        let vehicle = self.vehicle(&booking.vehicle_id)?;

        let _timer = self.metrics.start(OperationType::FeeCalculation);
        Ok(self.fees.invoice(booking, customer, vehicle))
    }

    // ===== Search =====

    fn search_engine(&self) -> SearchEngine<'_> {
        SearchEngine::new(&self.catalog, &self.fees, self.today())
    }

    pub fn search_vehicles(&self, criteria: &VehicleSearchCriteria) -> Vec<Vehicle> {
        let _timer = self.metrics.start(OperationType::Search);
        self.search_engine()
            .search_vehicles(criteria)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Customers only see their own bookings in results
    pub fn search_bookings(
        &self,
        actor: &CallerIdentity,
        criteria: &BookingSearchCriteria,
    ) -> Vec<Booking> {
        let _timer = self.metrics.start(OperationType::Search);
        self.search_engine()
            .search_bookings(criteria)
            .into_iter()
            .filter(|b| actor.can_act_for(&b.customer_id))
            .cloned()
            .collect()
    }

    pub fn find_best_matches(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        max_budget: Decimal,
        preferred_category: Option<VehicleCategory>,
    ) -> Vec<BestMatch> {
        let _timer = self.metrics.start(OperationType::Search);
        self.search_engine()
            .find_best_matches(start, end, max_budget, preferred_category)
    }

    pub fn recommend(&self, actor: &CallerIdentity, customer_id: &str) -> RentalResult<Recommendation> {
        Self::require_access(actor, customer_id)?;

        let _timer = self.metrics.start(OperationType::Recommendation);
        self.search_engine().recommend(customer_id)
    }
}
