use crate::rental::models::{Booking, Customer, Vehicle};

/// In-memory tables of vehicles, customers and bookings
///
/// Insertion order is preserved; every listing and search walks the tables
/// in that order, which keeps results stable between calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    vehicles: Vec<Vehicle>,
    customers: Vec<Customer>,
    bookings: Vec<Booking>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(vehicles: Vec<Vehicle>, customers: Vec<Customer>, bookings: Vec<Booking>) -> Self {
        Self {
            vehicles,
            customers,
            bookings,
        }
    }

    // Vehicles

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn vehicle_mut(&mut self, id: &str) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    pub fn push_vehicle(&mut self, vehicle: Vehicle) {
        self.vehicles.push(vehicle);
    }

    pub fn remove_vehicle(&mut self, id: &str) -> Option<Vehicle> {
        let position = self.vehicles.iter().position(|v| v.id == id)?;
        Some(self.vehicles.remove(position))
    }

    // Customers

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn customer_mut(&mut self, id: &str) -> Option<&mut Customer> {
        self.customers.iter_mut().find(|c| c.id == id)
    }

    pub fn push_customer(&mut self, customer: Customer) {
        self.customers.push(customer);
    }

    pub fn remove_customer(&mut self, id: &str) -> Option<Customer> {
        let position = self.customers.iter().position(|c| c.id == id)?;
        Some(self.customers.remove(position))
    }

    // Bookings

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn booking(&self, id: &str) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn booking_mut(&mut self, id: &str) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    pub fn push_booking(&mut self, booking: Booking) {
        self.bookings.push(booking);
    }

    pub fn remove_booking(&mut self, id: &str) -> Option<Booking> {
        let position = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(position))
    }

    /// Active bookings on a vehicle, optionally ignoring one booking
    pub fn active_bookings_on<'a>(
        &'a self,
        vehicle_id: &'a str,
        exclude_id: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Booking> + 'a {
        self.bookings
            .iter()
            .filter(move |b| b.is_active() && b.vehicle_id == vehicle_id)
            .filter(move |b| exclude_id != Some(b.id.as_str()))
    }

    pub fn bookings_for_customer<'a>(&'a self, customer_id: &'a str) -> impl Iterator<Item = &'a Booking> + 'a {
        self.bookings.iter().filter(move |b| b.customer_id == customer_id)
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty() && self.customers.is_empty() && self.bookings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business_rules::types::{VehicleCategory, VehicleStatus};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn sample() -> Catalog {
        let mut active = Booking::new("B1", "C1", "V1", date(10), date(12), 0);
        active.activate().unwrap();
        let mut cancelled = Booking::new("B2", "C1", "V1", date(20), date(22), 0);
        cancelled.activate().unwrap();
        cancelled.cancel().unwrap();

        Catalog::from_parts(
            Vehicle::samples(),
            vec![Customer::new("C1", "Nimal", "0771234567", "nimal@example.com")],
            vec![active, cancelled],
        )
    }

    #[test]
    fn test_lookup_by_id() {
        let catalog = sample();
        assert_eq!(catalog.vehicle("V002").unwrap().model, "Nissan Leaf");
        assert!(catalog.vehicle("V999").is_none());
        assert_eq!(catalog.customer("C1").unwrap().name, "Nimal");
        assert!(catalog.booking("B2").is_some());
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut catalog = sample();
        catalog.remove_vehicle("V002").unwrap();

        let ids: Vec<&str> = catalog.vehicles().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["V001", "V003"]);
        assert!(catalog.remove_vehicle("V002").is_none());
    }

    #[test]
    fn test_active_bookings_on_vehicle() {
        let catalog = sample();
        assert_eq!(catalog.active_bookings_on("V1", None).count(), 1);
        assert_eq!(catalog.active_bookings_on("V1", Some("B1")).count(), 0);
        assert_eq!(catalog.bookings_for_customer("C1").count(), 2);
    }

    #[test]
    fn test_mutation_through_handles() {
        let mut catalog = sample();
        catalog.vehicle_mut("V001").unwrap().status = VehicleStatus::UnderMaintenance;
        catalog.push_vehicle(Vehicle::new(
            "V004",
            "Suzuki Alto",
            VehicleCategory::CompactPetrol,
            Decimal::from(5000),
            VehicleStatus::Available,
        ));

        assert_eq!(
            catalog.vehicle("V001").unwrap().status,
            VehicleStatus::UnderMaintenance
        );
        assert_eq!(catalog.vehicles().len(), 4);
    }
}
