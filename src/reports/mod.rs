// Reports
//
// Read-only summaries over the catalog. Money figures are fee-calculator
// estimates at each booking's declared distance, deposit included.

pub mod handlers;
pub mod health;

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::business_rules::pricing::FeeCalculator;
use crate::business_rules::types::{VehicleCategory, VehicleStatus};
use crate::rental::{Booking, BookingState, Catalog, Customer, RentalError, RentalResult, RentalSystem};

pub use health::{HealthMonitor, HealthReport, HealthStatus};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CategoryRevenue {
    pub category: VehicleCategory,
    pub bookings: usize,
    pub revenue: Decimal,
    pub average_revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevenueReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub categories: Vec<CategoryRevenue>,
    pub total_revenue: Decimal,
    pub total_bookings: usize,
    pub average_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CategoryUtilization {
    pub category: VehicleCategory,
    pub total: usize,
    pub available: usize,
    pub reserved: usize,
    pub under_maintenance: usize,
    /// Share of the category that is reserved or in maintenance
    pub utilization_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UtilizationReport {
    pub categories: Vec<CategoryUtilization>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerBookingLine {
    pub booking: Booking,
    /// `None` when the vehicle has since been removed
    pub vehicle_model: Option<String>,
    pub days: i64,
    pub estimated_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerReport {
    pub customer: Customer,
    pub bookings: Vec<CustomerBookingLine>,
    pub total_spent: Decimal,
    pub average_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SystemSummary {
    pub total_vehicles: usize,
    pub total_customers: usize,
    pub total_bookings: usize,
    pub active_bookings: usize,
    pub available_vehicles: usize,
    pub reserved_vehicles: usize,
    pub maintenance_vehicles: usize,
    /// Reserved vehicles as a share of the fleet
    pub utilization_percent: Decimal,
    pub vehicles_by_category: BTreeMap<VehicleCategory, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Pickup,
    Return,
}

/// A pickup or return falling due tomorrow
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Reminder {
    pub kind: ReminderKind,
    pub booking_id: String,
    pub customer_id: String,
    /// `None` when the customer record is gone
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub vehicle_id: String,
    pub date: NaiveDate,
}

/// `part / whole` as a percentage with one decimal place
fn percent(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part as u64) * Decimal::from(100) / Decimal::from(whole as u64)).round_dp(1)
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        (total / Decimal::from(count as u64)).round_dp(2)
    }
}

pub struct ReportGenerator<'a> {
    catalog: &'a Catalog,
    fees: &'a FeeCalculator,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(catalog: &'a Catalog, fees: &'a FeeCalculator) -> Self {
        Self { catalog, fees }
    }

    pub fn for_system(system: &'a RentalSystem) -> Self {
        Self::new(system.catalog(), system.fees())
    }

    /// Estimated total, or `None` when the vehicle is gone
    fn estimated_cost(&self, booking: &Booking) -> Option<(VehicleCategory, Decimal)> {
        let category = self.catalog.vehicle(&booking.vehicle_id)?.category;
        Some((category, self.fees.estimate(booking, category).total))
    }

    /// Revenue of non-cancelled bookings starting inside `[from, to]`
    pub fn revenue(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> RevenueReport {
        let mut by_category: BTreeMap<VehicleCategory, (usize, Decimal)> = BTreeMap::new();

        for booking in self.catalog.bookings() {
            if booking.state == BookingState::Cancelled {
                continue;
            }
            if from.map_or(false, |from| booking.start_date < from)
                || to.map_or(false, |to| booking.start_date > to)
            {
                continue;
            }
            if let Some((category, cost)) = self.estimated_cost(booking) {
                let entry = by_category.entry(category).or_insert((0, Decimal::ZERO));
                entry.0 += 1;
                entry.1 += cost;
            }
        }

        let categories: Vec<CategoryRevenue> = by_category
            .into_iter()
            .map(|(category, (bookings, revenue))| CategoryRevenue {
                category,
                bookings,
                revenue,
                average_revenue: average(revenue, bookings),
            })
            .collect();

        let total_revenue: Decimal = categories.iter().map(|c| c.revenue).sum();
        let total_bookings: usize = categories.iter().map(|c| c.bookings).sum();

        RevenueReport {
            from,
            to,
            categories,
            total_revenue,
            total_bookings,
            average_revenue: average(total_revenue, total_bookings),
        }
    }

    /// Fleet status per category
    pub fn utilization(&self) -> UtilizationReport {
        let mut by_category: BTreeMap<VehicleCategory, CategoryUtilization> = BTreeMap::new();

        for vehicle in self.catalog.vehicles() {
            let entry = by_category
                .entry(vehicle.category)
                .or_insert_with(|| CategoryUtilization {
                    category: vehicle.category,
                    total: 0,
                    available: 0,
                    reserved: 0,
                    under_maintenance: 0,
                    utilization_percent: Decimal::ZERO,
                });
            entry.total += 1;
            match vehicle.status {
                VehicleStatus::Available => entry.available += 1,
                VehicleStatus::Reserved => entry.reserved += 1,
                VehicleStatus::UnderMaintenance => entry.under_maintenance += 1,
            }
        }

        let categories = by_category
            .into_values()
            .map(|mut line| {
                line.utilization_percent = percent(line.reserved + line.under_maintenance, line.total);
                line
            })
            .collect();

        UtilizationReport { categories }
    }

    /// Booking history of one customer with estimated costs
    pub fn customer(&self, customer_id: &str) -> RentalResult<CustomerReport> {
        let customer = self
            .catalog
            .customer(customer_id)
            .ok_or_else(|| RentalError::CustomerNotFound(customer_id.to_string()))?;

        let bookings: Vec<CustomerBookingLine> = self
            .catalog
            .bookings_for_customer(customer_id)
            .map(|booking| CustomerBookingLine {
                booking: booking.clone(),
                vehicle_model: self
                    .catalog
                    .vehicle(&booking.vehicle_id)
                    .map(|v| v.model.clone()),
                days: booking.duration_in_days(),
                estimated_cost: self
                    .estimated_cost(booking)
                    .map_or(Decimal::ZERO, |(_, cost)| cost),
            })
            .collect();

        let total_spent: Decimal = bookings.iter().map(|line| line.estimated_cost).sum();
        let average_cost = average(total_spent, bookings.len());

        Ok(CustomerReport {
            customer: customer.clone(),
            bookings,
            total_spent,
            average_cost,
        })
    }

    /// Pickups and returns of active bookings due the day after `today`
    ///
    /// Pickups come first; a one-day rental yields both.
    pub fn reminders_due(&self, today: NaiveDate) -> Vec<Reminder> {
        let tomorrow = today + Duration::days(1);
        let mut reminders = Vec::new();

        for booking in self.catalog.bookings().iter().filter(|b| b.is_active()) {
            let customer = self.catalog.customer(&booking.customer_id);
            let reminder = |kind| Reminder {
                kind,
                booking_id: booking.id.clone(),
                customer_id: booking.customer_id.clone(),
                customer_name: customer.map(|c| c.name.clone()),
                email: customer.map(|c| c.email.clone()),
                vehicle_id: booking.vehicle_id.clone(),
                date: tomorrow,
            };

            if booking.start_date == tomorrow {
                reminders.push(reminder(ReminderKind::Pickup));
            }
            if booking.end_date == tomorrow {
                reminders.push(reminder(ReminderKind::Return));
            }
        }

        reminders.sort_by_key(|r| r.kind);
        reminders
    }

    pub fn summary(&self) -> SystemSummary {
        let vehicles = self.catalog.vehicles();
        let count_status = |status: VehicleStatus| vehicles.iter().filter(|v| v.status == status).count();

        let mut vehicles_by_category = BTreeMap::new();
        for vehicle in vehicles {
            *vehicles_by_category.entry(vehicle.category).or_insert(0) += 1;
        }

        let reserved_vehicles = count_status(VehicleStatus::Reserved);

        SystemSummary {
            total_vehicles: vehicles.len(),
            total_customers: self.catalog.customers().len(),
            total_bookings: self.catalog.bookings().len(),
            active_bookings: self.catalog.bookings().iter().filter(|b| b.is_active()).count(),
            available_vehicles: count_status(VehicleStatus::Available),
            reserved_vehicles,
            maintenance_vehicles: count_status(VehicleStatus::UnderMaintenance),
            utilization_percent: percent(reserved_vehicles, vehicles.len()),
            vehicles_by_category,
        }
    }
}
