// Availability Engine
//
// Decides whether a vehicle can be booked for a date range.
// A vehicle is bookable when its status is Available and none of the active
// bookings on it overlap the requested range (both ends inclusive).

use crate::business_rules::types::VehicleStatus;
use crate::rental::models::{Booking, Vehicle};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// Creation requires the start date to be strictly after today + 2 days
pub const CREATE_NOTICE_DAYS: i64 = 2;

/// Update, cancellation and deletion require start strictly after today + 1 day
pub const CHANGE_NOTICE_DAYS: i64 = 1;

/// Whether two inclusive date ranges share at least one calendar day
pub fn ranges_overlap(
    first_start: NaiveDate,
    first_end: NaiveDate,
    second_start: NaiveDate,
    second_end: NaiveDate,
) -> bool {
    !(first_end < second_start || first_start > second_end)
}

/// Whether a booking starting on `start` may still be changed on `today`
pub fn within_change_window(start: NaiveDate, today: NaiveDate) -> bool {
    start > today + Duration::days(CHANGE_NOTICE_DAYS)
}

/// Active bookings grouped by vehicle key
///
/// Built once per search so that each candidate vehicle only scans its own bookings.
#[derive(Debug, Default)]
pub struct BookingIndex<'a> {
    by_vehicle: HashMap<&'a str, Vec<&'a Booking>>,
}

impl<'a> BookingIndex<'a> {
    pub fn build(bookings: impl IntoIterator<Item = &'a Booking>) -> Self {
        let mut by_vehicle: HashMap<&'a str, Vec<&'a Booking>> = HashMap::new();
        for booking in bookings.into_iter().filter(|b| b.is_active()) {
            by_vehicle
                .entry(booking.vehicle_id.as_str())
                .or_default()
                .push(booking);
        }
        Self { by_vehicle }
    }

    pub fn for_vehicle(&self, vehicle_id: &str) -> &[&'a Booking] {
        self.by_vehicle
            .get(vehicle_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Outcome of validating a candidate booking
#[derive(Debug, Clone, PartialEq)]
pub struct BookingValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl BookingValidationResult {
    /// All reasons joined into one message
    pub fn reason(&self) -> String {
        self.errors.join("; ")
    }
}

/// Availability Engine
///
/// Stateless; every check takes the bookings it should consider.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityEngine;

impl AvailabilityEngine {
    pub fn new() -> Self {
        Self
    }

    /// Active bookings on `vehicle_id` whose range overlaps `[start, end]`
    pub fn conflicts<'a>(
        &self,
        vehicle_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        bookings: impl IntoIterator<Item = &'a Booking>,
        exclude_id: Option<&str>,
    ) -> Vec<&'a Booking> {
        bookings
            .into_iter()
            .filter(|b| b.is_active() && b.vehicle_id == vehicle_id)
            .filter(|b| exclude_id != Some(b.id.as_str()))
            .filter(|b| ranges_overlap(start, end, b.start_date, b.end_date))
            .collect()
    }

    pub fn is_bookable<'a>(
        &self,
        vehicle: &Vehicle,
        start: NaiveDate,
        end: NaiveDate,
        bookings: impl IntoIterator<Item = &'a Booking>,
    ) -> bool {
        vehicle.status == VehicleStatus::Available
            && self.conflicts(&vehicle.id, start, end, bookings, None).is_empty()
    }

    /// Validate a candidate booking for creation or update
    ///
    /// `vehicle_status` is the status the vehicle would have if the candidate
    /// did not exist, so an update can keep the vehicle it already reserved.
    /// The candidate itself is never counted as a conflict.
    pub fn validate_booking<'a>(
        &self,
        candidate: &Booking,
        vehicle_status: VehicleStatus,
        bookings: impl IntoIterator<Item = &'a Booking>,
        today: NaiveDate,
    ) -> BookingValidationResult {
        let mut errors = Vec::new();

        if vehicle_status != VehicleStatus::Available {
            errors.push(format!(
                "vehicle {} is not available ({})",
                candidate.vehicle_id, vehicle_status
            ));
        }

        let earliest_start = today + Duration::days(CREATE_NOTICE_DAYS + 1);
        if candidate.start_date < earliest_start {
            errors.push(format!(
                "start date must be on or after {}",
                earliest_start
            ));
        }

        if candidate.start_date > candidate.end_date {
            errors.push("start date must not be after end date".to_string());
        }

        for conflict in self.conflicts(
            &candidate.vehicle_id,
            candidate.start_date,
            candidate.end_date,
            bookings,
            Some(&candidate.id),
        ) {
            errors.push(format!(
                "overlaps booking {} ({} to {})",
                conflict.id, conflict.start_date, conflict.end_date
            ));
        }

        BookingValidationResult {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}
