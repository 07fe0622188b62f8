// Search & Recommendation Engine
//
// Read-only queries over the catalog: conjunctive vehicle and booking filters,
// budget-constrained best matches for a date range, and history-based
// recommendations for a customer.

use crate::business_rules::{
    availability::{within_change_window, AvailabilityEngine, BookingIndex},
    pricing::{FeeCalculator, LONG_RENTAL_DAYS, long_rental_discount_rate},
    types::{VehicleCategory, VehicleStatus},
};
use crate::rental::error::{RentalError, RentalResult};
use crate::rental::models::{rental_days, Booking, BookingState, Vehicle};
use crate::rental::repository::Catalog;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Most vehicles returned by a recommendation
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Below this many favourite-category picks, cheaper alternatives are added
pub const MIN_FAVORITE_PICKS: usize = 3;

/// Assumed cost per day when a customer's history has no billable days
pub fn default_daily_budget() -> Decimal {
    Decimal::from(7500)
}

/// Alternatives may cost up to 20% more per day than the customer's average
fn alternative_price_factor() -> Decimal {
    Decimal::new(12, 1)
}

/// Conjunctive vehicle filter; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct VehicleSearchCriteria {
    /// Case-insensitive substring of the category display name
    pub category: Option<String>,
    pub max_price: Option<Decimal>,
    /// Inclusive range the vehicle must be bookable for
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub status: Option<VehicleStatus>,
    /// Case-insensitive substring of the model name
    pub model_keyword: Option<String>,
}

/// Where a booking sits relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingPhase {
    /// Starts after today
    Upcoming,
    /// Today falls inside the booking
    Active,
    /// Ended before today
    Completed,
    /// Still inside the change window (starts after tomorrow)
    Cancelable,
}

impl BookingPhase {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" => Ok(BookingPhase::Upcoming),
            "active" => Ok(BookingPhase::Active),
            "completed" => Ok(BookingPhase::Completed),
            "cancelable" | "cancellable" => Ok(BookingPhase::Cancelable),
            _ => Err(format!("Invalid booking status filter: {}", s)),
        }
    }

    /// Cancelled bookings are in no phase
    pub fn matches(&self, booking: &Booking, today: NaiveDate) -> bool {
        if booking.state == BookingState::Cancelled {
            return false;
        }
        match self {
            BookingPhase::Upcoming => booking.days_until_start(today) > 0,
            BookingPhase::Active => booking.contains_date(today),
            BookingPhase::Completed => booking.end_date < today,
            BookingPhase::Cancelable => within_change_window(booking.start_date, today),
        }
    }
}

/// Conjunctive booking filter; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct BookingSearchCriteria {
    pub customer_name: Option<String>,
    pub vehicle_model: Option<String>,
    /// Bookings starting on or after this date
    pub from: Option<NaiveDate>,
    /// Bookings ending on or before this date
    pub to: Option<NaiveDate>,
    pub booking_id: Option<String>,
    pub phase: Option<BookingPhase>,
}

/// A vehicle that fits a date range and budget
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BestMatch {
    pub vehicle: Vehicle,
    pub preferred: bool,
    /// Vehicle daily rate x days, less the long-rental discount
    pub estimated_price: Decimal,
    /// Fee calculator total at zero extra distance, deposit included
    pub estimated_total: Decimal,
    pub unpriced: bool,
}

/// Vehicles suggested to a customer and what the suggestion was based on
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    pub customer_id: String,
    /// `None` when the customer has no history and popular vehicles were used
    pub favorite_category: Option<VehicleCategory>,
    pub average_daily_cost: Option<Decimal>,
    pub vehicles: Vec<Vehicle>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Search engine over a borrowed catalog
pub struct SearchEngine<'a> {
    catalog: &'a Catalog,
    fees: &'a FeeCalculator,
    availability: AvailabilityEngine,
    today: NaiveDate,
}

impl<'a> SearchEngine<'a> {
    pub fn new(catalog: &'a Catalog, fees: &'a FeeCalculator, today: NaiveDate) -> Self {
        Self {
            catalog,
            fees,
            availability: AvailabilityEngine::new(),
            today,
        }
    }

    /// Vehicles matching every supplied criterion, in catalog order
    pub fn search_vehicles(&self, criteria: &VehicleSearchCriteria) -> Vec<&'a Vehicle> {
        let index = BookingIndex::build(self.catalog.bookings());

        self.catalog
            .vehicles()
            .iter()
            .filter(|v| {
                criteria
                    .category
                    .as_deref()
                    .map_or(true, |c| contains_ignore_case(v.category.display_name(), c))
            })
            .filter(|v| criteria.max_price.map_or(true, |max| v.daily_rate <= max))
            .filter(|v| criteria.status.map_or(true, |status| v.status == status))
            .filter(|v| {
                criteria
                    .model_keyword
                    .as_deref()
                    .map_or(true, |keyword| contains_ignore_case(&v.model, keyword))
            })
            .filter(|v| {
                criteria.date_range.map_or(true, |(start, end)| {
                    self.availability.is_bookable(
                        v,
                        start,
                        end,
                        index.for_vehicle(&v.id).iter().copied(),
                    )
                })
            })
            .collect()
    }

    /// Bookings matching every supplied criterion, in catalog order
    pub fn search_bookings(&self, criteria: &BookingSearchCriteria) -> Vec<&'a Booking> {
        self.catalog
            .bookings()
            .iter()
            .filter(|b| {
                criteria.customer_name.as_deref().map_or(true, |name| {
                    self.catalog
                        .customer(&b.customer_id)
                        .map_or(false, |c| contains_ignore_case(&c.name, name))
                })
            })
            .filter(|b| {
                criteria.vehicle_model.as_deref().map_or(true, |model| {
                    self.catalog
                        .vehicle(&b.vehicle_id)
                        .map_or(false, |v| contains_ignore_case(&v.model, model))
                })
            })
            .filter(|b| criteria.from.map_or(true, |from| b.start_date >= from))
            .filter(|b| criteria.to.map_or(true, |to| b.end_date <= to))
            .filter(|b| {
                criteria
                    .booking_id
                    .as_deref()
                    .map_or(true, |id| contains_ignore_case(&b.id, id))
            })
            .filter(|b| criteria.phase.map_or(true, |phase| phase.matches(b, self.today)))
            .collect()
    }

    /// Ranking price: vehicle daily rate for the range, less 10% for long rentals
    fn ranking_price(vehicle: &Vehicle, days: i64) -> Decimal {
        let price = vehicle.daily_rate * Decimal::from(days);
        if days >= LONG_RENTAL_DAYS {
            price * (Decimal::ONE - long_rental_discount_rate())
        } else {
            price
        }
    }

    /// Bookable vehicles within budget, preferred category first, then cheapest first
    pub fn find_best_matches(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        max_budget: Decimal,
        preferred_category: Option<VehicleCategory>,
    ) -> Vec<BestMatch> {
        let days = rental_days(start, end);
        let index = BookingIndex::build(self.catalog.bookings());

        let mut matches: Vec<BestMatch> = self
            .catalog
            .vehicles()
            .iter()
            .filter(|v| {
                self.availability
                    .is_bookable(v, start, end, index.for_vehicle(&v.id).iter().copied())
            })
            .map(|v| {
                let quote = self.fees.quote(v.category, days, 0);
                BestMatch {
                    vehicle: v.clone(),
                    preferred: preferred_category == Some(v.category),
                    estimated_price: Self::ranking_price(v, days),
                    estimated_total: quote.total,
                    unpriced: quote.unpriced,
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.preferred
                .cmp(&a.preferred)
                .then_with(|| a.estimated_price.cmp(&b.estimated_price))
        });
        matches.retain(|m| m.estimated_total <= max_budget);
        matches
    }

    /// Suggest vehicles for a customer
    ///
    /// Without history: the most-booked Available vehicles. With history:
    /// Available vehicles in the favourite category priced at or under the
    /// customer's average daily spend, topped up with other categories up to
    /// 20% above that average when fewer than three were found.
    pub fn recommend(&self, customer_id: &str) -> RentalResult<Recommendation> {
        if self.catalog.customer(customer_id).is_none() {
            return Err(RentalError::CustomerNotFound(customer_id.to_string()));
        }

        let history: Vec<(&Booking, &Vehicle)> = self
            .catalog
            .bookings_for_customer(customer_id)
            .filter(|b| b.state != BookingState::Cancelled)
            .filter_map(|b| self.catalog.vehicle(&b.vehicle_id).map(|v| (b, v)))
            .collect();

        if history.is_empty() {
            return Ok(Recommendation {
                customer_id: customer_id.to_string(),
                favorite_category: None,
                average_daily_cost: None,
                vehicles: self.popular_vehicles(),
            });
        }

        let favorite = Self::favorite_category(history.iter().map(|(_, v)| v.category));

        let total_days: i64 = history.iter().map(|(b, _)| b.duration_in_days()).sum();
        let total_spent: Decimal = history
            .iter()
            .map(|(b, v)| self.fees.estimate(b, v.category).total)
            .sum();
        let average = if total_days == 0 {
            default_daily_budget()
        } else {
            total_spent / Decimal::from(total_days)
        };

        let mut picks: Vec<Vehicle> = self
            .catalog
            .vehicles()
            .iter()
            .filter(|v| v.is_available() && v.category == favorite && v.daily_rate <= average)
            .take(MAX_RECOMMENDATIONS)
            .cloned()
            .collect();

        if picks.len() < MIN_FAVORITE_PICKS {
            let ceiling = average * alternative_price_factor();
            let room = MAX_RECOMMENDATIONS - picks.len();
            let alternatives: Vec<Vehicle> = self
                .catalog
                .vehicles()
                .iter()
                .filter(|v| v.is_available() && v.category != favorite && v.daily_rate <= ceiling)
                .filter(|v| !picks.iter().any(|p| p.id == v.id))
                .take(room)
                .cloned()
                .collect();
            picks.extend(alternatives);
        }

        Ok(Recommendation {
            customer_id: customer_id.to_string(),
            favorite_category: Some(favorite),
            average_daily_cost: Some(average),
            vehicles: picks,
        })
    }

    /// Most frequent category; ties go to the category seen first
    fn favorite_category(categories: impl Iterator<Item = VehicleCategory>) -> VehicleCategory {
        let mut counts: Vec<(VehicleCategory, usize)> = Vec::new();
        for category in categories {
            match counts.iter_mut().find(|(c, _)| *c == category) {
                Some((_, count)) => *count += 1,
                None => counts.push((category, 1)),
            }
        }

        let mut best = counts
            .first()
            .copied()
            .unwrap_or((VehicleCategory::Hybrid, 0));
        for &(category, count) in counts.iter().skip(1) {
            if count > best.1 {
                best = (category, count);
            }
        }
        best.0
    }

    /// Available vehicles ordered by how often they were booked
    fn popular_vehicles(&self) -> Vec<Vehicle> {
        let booking_count = |vehicle_id: &str| {
            self.catalog
                .bookings()
                .iter()
                .filter(|b| b.state != BookingState::Cancelled && b.vehicle_id == vehicle_id)
                .count()
        };

        let mut ranked: Vec<(&Vehicle, usize)> = self
            .catalog
            .vehicles()
            .iter()
            .filter(|v| v.is_available())
            .map(|v| (v, booking_count(&v.id)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        ranked
            .into_iter()
            .take(MAX_RECOMMENDATIONS)
            .map(|(v, _)| v.clone())
            .collect()
    }
}
