// System Health Monitor
//
// Checks the loaded catalog for integrity problems and for vehicle statuses
// that disagree with the bookings, and reports the state of persistence.
// The overall status is the worst component status.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::business_rules::metrics::MetricsSummary;
use crate::business_rules::types::VehicleStatus;
use crate::rental::{Catalog, RentalSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

/// Status of one check plus what it found
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    pub findings: Vec<String>,
}

impl ComponentHealth {
    fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            findings: Vec::new(),
        }
    }

    fn flag(&mut self, status: HealthStatus, finding: String) {
        self.status = self.status.max(status);
        self.findings.push(finding);
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub storage: ComponentHealth,
    pub data_integrity: ComponentHealth,
    pub business_rules: ComponentHealth,
    pub metrics: MetricsSummary,
    pub checked_at: DateTime<Utc>,
}

fn flag_duplicates<'a>(kind: &str, ids: impl Iterator<Item = &'a str>, health: &mut ComponentHealth) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            health.flag(HealthStatus::Warning, format!("duplicate {} id {}", kind, id));
        }
    }
}

pub struct HealthMonitor;

impl HealthMonitor {
    pub fn check(system: &RentalSystem) -> HealthReport {
        let storage = Self::check_storage(system.last_save_error(), system.skipped_records());
        let data_integrity = Self::check_data_integrity(system.catalog());
        let business_rules = Self::check_business_rules(system.catalog(), system.today());

        let status = storage
            .status
            .max(data_integrity.status)
            .max(business_rules.status);

        match status {
            HealthStatus::Healthy => tracing::debug!("Health check completed: healthy"),
            other => tracing::warn!("Health check completed: {:?}", other),
        }

        HealthReport {
            status,
            storage,
            data_integrity,
            business_rules,
            metrics: system.metrics().summary(),
            checked_at: Utc::now(),
        }
    }

    fn check_storage(last_save_error: Option<&str>, skipped_records: usize) -> ComponentHealth {
        let mut health = ComponentHealth::healthy();
        if let Some(error) = last_save_error {
            health.flag(HealthStatus::Critical, format!("last save failed: {}", error));
        }
        if skipped_records > 0 {
            health.flag(
                HealthStatus::Warning,
                format!("{} records were skipped while loading", skipped_records),
            );
        }
        health
    }

    /// Active bookings with a missing customer or vehicle are critical;
    /// duplicate keys and inverted ranges are warnings
    pub fn check_data_integrity(catalog: &Catalog) -> ComponentHealth {
        let mut health = ComponentHealth::healthy();

        for booking in catalog.bookings() {
            if catalog.customer(&booking.customer_id).is_none() && booking.is_active() {
                health.flag(
                    HealthStatus::Critical,
                    format!("booking {} references missing customer {}", booking.id, booking.customer_id),
                );
            }
            if catalog.vehicle(&booking.vehicle_id).is_none() && booking.is_active() {
                health.flag(
                    HealthStatus::Critical,
                    format!("booking {} references missing vehicle {}", booking.id, booking.vehicle_id),
                );
            }
            if booking.start_date > booking.end_date {
                health.flag(
                    HealthStatus::Warning,
                    format!("booking {} ends before it starts", booking.id),
                );
            }
        }

        flag_duplicates("vehicle", catalog.vehicles().iter().map(|v| v.id.as_str()), &mut health);
        flag_duplicates("customer", catalog.customers().iter().map(|c| c.id.as_str()), &mut health);
        flag_duplicates("booking", catalog.bookings().iter().map(|b| b.id.as_str()), &mut health);

        health
    }

    /// Vehicle statuses that disagree with the active bookings
    pub fn check_business_rules(catalog: &Catalog, today: NaiveDate) -> ComponentHealth {
        let mut health = ComponentHealth::healthy();

        for vehicle in catalog.vehicles() {
            let mut active = catalog.active_bookings_on(&vehicle.id, None).peekable();
            let has_active = active.peek().is_some();
            let in_progress = active.any(|b| b.contains_date(today));

            if vehicle.status == VehicleStatus::Reserved && !has_active {
                health.flag(
                    HealthStatus::Warning,
                    format!("vehicle {} is reserved without an active booking", vehicle.id),
                );
            }
            if vehicle.status == VehicleStatus::Available && in_progress {
                health.flag(
                    HealthStatus::Warning,
                    format!("vehicle {} is available during an active booking", vehicle.id),
                );
            }
        }

        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::{Booking, Customer, Vehicle};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn active(id: &str, customer: &str, vehicle: &str, start: NaiveDate, end: NaiveDate) -> Booking {
        let mut booking = Booking::new(id, customer, vehicle, start, end, 0);
        booking.activate().unwrap();
        booking
    }

    fn customers() -> Vec<Customer> {
        vec![Customer::new("C001", "Nimal Perera", "0771234567", "nimal@example.com")]
    }

    #[test]
    fn test_consistent_catalog_is_healthy() {
        let mut vehicles = Vehicle::samples();
        vehicles[0].status = VehicleStatus::Reserved;
        let catalog = Catalog::from_parts(
            vehicles,
            customers(),
            vec![active("B001", "C001", "V001", date(2025, 3, 10), date(2025, 3, 12))],
        );

        assert_eq!(HealthMonitor::check_data_integrity(&catalog).status, HealthStatus::Healthy);
        assert_eq!(
            HealthMonitor::check_business_rules(&catalog, date(2025, 3, 11)).status,
            HealthStatus::Healthy
        );
    }

    #[test]
    fn test_orphaned_booking_is_critical() {
        let catalog = Catalog::from_parts(
            Vehicle::samples(),
            customers(),
            vec![active("B001", "C999", "V001", date(2025, 3, 10), date(2025, 3, 12))],
        );

        let health = HealthMonitor::check_data_integrity(&catalog);
        assert_eq!(health.status, HealthStatus::Critical);
        assert_eq!(health.findings.len(), 1);
    }

    #[test]
    fn test_duplicates_and_inverted_ranges_warn() {
        let mut vehicles = Vehicle::samples();
        vehicles.push(vehicles[0].clone());
        let catalog = Catalog::from_parts(
            vehicles,
            customers(),
            vec![active("B001", "C001", "V002", date(2025, 3, 12), date(2025, 3, 10))],
        );

        let health = HealthMonitor::check_data_integrity(&catalog);
        assert_eq!(health.status, HealthStatus::Warning);
        assert_eq!(health.findings.len(), 2);
    }

    #[test]
    fn test_status_mismatches_warn() {
        let mut vehicles = Vehicle::samples();
        vehicles[2].status = VehicleStatus::Reserved;
        let catalog = Catalog::from_parts(
            vehicles,
            customers(),
            vec![active("B001", "C001", "V001", date(2025, 3, 10), date(2025, 3, 12))],
        );

        let health = HealthMonitor::check_business_rules(&catalog, date(2025, 3, 11));
        assert_eq!(health.status, HealthStatus::Warning);
        assert_eq!(health.findings.len(), 2);
    }

    #[test]
    fn test_storage_findings() {
        assert_eq!(HealthMonitor::check_storage(None, 0).status, HealthStatus::Healthy);
        assert_eq!(HealthMonitor::check_storage(None, 3).status, HealthStatus::Warning);
        assert_eq!(
            HealthMonitor::check_storage(Some("disk full"), 0).status,
            HealthStatus::Critical
        );
    }

    #[test]
    fn test_status_ordering() {
        assert!(HealthStatus::Critical > HealthStatus::Warning);
        assert!(HealthStatus::Warning > HealthStatus::Healthy);
    }
}
