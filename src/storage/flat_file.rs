// Flat-file catalog store
//
// Three comma-delimited files without headers:
//   vehicles.csv   id,model,category,dailyRate,status
//   customers.csv  id,name,contact,email
//   bookings.csv   id,customerId,vehicleId,startDate,endDate,totalDistance[,state]
//
// Fields are never quoted, so ids, names and models cannot contain a comma.
// Records that cannot be parsed are skipped with a warning and loading
// continues. Bookings written without a state column are active.

use crate::business_rules::types::{VehicleCategory, VehicleStatus};
use crate::rental::models::{Booking, BookingState, Customer, Vehicle};
use crate::rental::repository::Catalog;
use crate::storage::{CatalogStore, LoadOutcome, StorageError};
use chrono::NaiveDate;
use csv::{ByteRecord, StringRecord};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const VEHICLES_FILE: &str = "vehicles.csv";
pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const BOOKINGS_FILE: &str = "bookings.csv";

/// Accepted date layouts, tried in order
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Parse ISO-8601, then dd/MM/yyyy, then MM/dd/yyyy
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

#[derive(Debug, Clone)]
pub struct FlatFileStore {
    dir: PathBuf,
}

impl FlatFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn open_or_empty(&self, name: &str) -> Result<Box<dyn Read>, StorageError> {
        let path = self.dir.join(name);
        match File::open(&path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("{} not found, starting with no records", path.display());
                Ok(Box::new(io::empty()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse the three record streams into a catalog
    pub fn parse_catalog(
        vehicles: impl Read,
        customers: impl Read,
        bookings: impl Read,
    ) -> Result<LoadOutcome, StorageError> {
        let mut catalog = Catalog::new();
        let mut skipped = Vec::new();

        for (line, record) in read_records(vehicles, VEHICLES_FILE, &mut skipped)? {
            match parse_vehicle(&record) {
                Ok(vehicle) if catalog.vehicle(&vehicle.id).is_some() => {
                    skipped.push(malformed(VEHICLES_FILE, line, format!("duplicate vehicle id {}", vehicle.id)));
                }
                Ok(vehicle) => catalog.push_vehicle(vehicle),
                Err(reason) => skipped.push(malformed(VEHICLES_FILE, line, reason)),
            }
        }

        for (line, record) in read_records(customers, CUSTOMERS_FILE, &mut skipped)? {
            match parse_customer(&record) {
                Ok(customer) if catalog.customer(&customer.id).is_some() => {
                    skipped.push(malformed(CUSTOMERS_FILE, line, format!("duplicate customer id {}", customer.id)));
                }
                Ok(customer) => catalog.push_customer(customer),
                Err(reason) => skipped.push(malformed(CUSTOMERS_FILE, line, reason)),
            }
        }

        for (line, record) in read_records(bookings, BOOKINGS_FILE, &mut skipped)? {
            match parse_booking(&record, &catalog) {
                Ok(booking) => catalog.push_booking(booking),
                Err(reason) => skipped.push(malformed(BOOKINGS_FILE, line, reason)),
            }
        }

        // Stored status may be stale; active bookings always hold their vehicle
        let reserved: Vec<String> = catalog
            .bookings()
            .iter()
            .filter(|b| b.is_active())
            .map(|b| b.vehicle_id.clone())
            .collect();
        for vehicle_id in reserved {
            if let Some(vehicle) = catalog.vehicle_mut(&vehicle_id) {
                vehicle.status = VehicleStatus::Reserved;
            }
        }

        for error in &skipped {
            warn!("Skipping record: {}", error);
        }

        Ok(LoadOutcome { catalog, skipped })
    }

    fn write_file(&self, name: &str, rows: Vec<Vec<String>>) -> Result<(), StorageError> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{}.tmp", name));

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .from_path(&tmp)?;
        for row in rows {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        drop(writer);

        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl CatalogStore for FlatFileStore {
    fn load(&self) -> Result<LoadOutcome, StorageError> {
        let outcome = Self::parse_catalog(
            self.open_or_empty(VEHICLES_FILE)?,
            self.open_or_empty(CUSTOMERS_FILE)?,
            self.open_or_empty(BOOKINGS_FILE)?,
        )?;

        info!(
            "Loaded {} vehicles, {} customers, {} bookings from {} ({} records skipped)",
            outcome.catalog.vehicles().len(),
            outcome.catalog.customers().len(),
            outcome.catalog.bookings().len(),
            self.dir.display(),
            outcome.skipped.len()
        );
        Ok(outcome)
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;

        self.write_file(
            VEHICLES_FILE,
            catalog.vehicles().iter().map(vehicle_row).collect(),
        )?;
        self.write_file(
            CUSTOMERS_FILE,
            catalog.customers().iter().map(customer_row).collect(),
        )?;
        self.write_file(
            BOOKINGS_FILE,
            catalog.bookings().iter().map(booking_row).collect(),
        )?;

        debug!("Saved catalog to {}", self.dir.display());
        Ok(())
    }
}

fn malformed(file: &str, line: u64, reason: String) -> StorageError {
    StorageError::Malformed {
        file: file.to_string(),
        line,
        reason,
    }
}

/// Non-blank records with their line numbers
///
/// Undecodable records are pushed onto `skipped`; only I/O failures abort.
fn read_records(
    reader: impl Read,
    file: &str,
    skipped: &mut Vec<StorageError>,
) -> Result<Vec<(u64, StringRecord)>, StorageError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in csv_reader.byte_records() {
        let raw: ByteRecord = match result {
            Ok(raw) => raw,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                skipped.push(malformed(file, line, e.to_string()));
                continue;
            }
        };
        if raw.iter().all(|field| field.is_empty()) {
            continue;
        }

        let line = raw.position().map_or(0, |p| p.line());
        match StringRecord::from_byte_record(raw) {
            Ok(record) => records.push((line, record)),
            Err(e) => skipped.push(malformed(file, line, format!("invalid UTF-8: {}", e.utf8_error()))),
        }
    }
    Ok(records)
}

fn expect_fields(record: &StringRecord, expected: &[usize]) -> Result<(), String> {
    if expected.contains(&record.len()) {
        Ok(())
    } else {
        Err(format!(
            "expected {} fields, found {}",
            expected
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(" or "),
            record.len()
        ))
    }
}

fn required<'a>(record: &'a StringRecord, index: usize, name: &str) -> Result<&'a str, String> {
    match record.get(index) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(format!("{} is empty", name)),
    }
}

fn parse_vehicle(record: &StringRecord) -> Result<Vehicle, String> {
    expect_fields(record, &[5])?;

    let id = required(record, 0, "vehicle id")?;
    let model = required(record, 1, "model")?;
    let category = VehicleCategory::from_str(&record[2])?;
    let raw_rate = &record[3];
    let daily_rate = Decimal::from_str(raw_rate)
        .or_else(|_| Decimal::from_scientific(raw_rate))
        .map_err(|_| format!("invalid daily rate '{}'", raw_rate))?;
    if daily_rate.is_sign_negative() {
        return Err(format!("negative daily rate '{}'", raw_rate));
    }
    let status = VehicleStatus::from_str(&record[4])?;

    Ok(Vehicle::new(id, model, category, daily_rate, status))
}

fn parse_customer(record: &StringRecord) -> Result<Customer, String> {
    expect_fields(record, &[4])?;

    Ok(Customer::new(
        required(record, 0, "customer id")?,
        &record[1],
        &record[2],
        &record[3],
    ))
}

fn parse_booking(record: &StringRecord, catalog: &Catalog) -> Result<Booking, String> {
    expect_fields(record, &[6, 7])?;

    let id = required(record, 0, "booking id")?;
    if catalog.booking(id).is_some() {
        return Err(format!("duplicate booking id {}", id));
    }

    let customer_id = &record[1];
    if catalog.customer(customer_id).is_none() {
        return Err(format!("booking {} references unknown customer {}", id, customer_id));
    }
    let vehicle_id = &record[2];
    if catalog.vehicle(vehicle_id).is_none() {
        return Err(format!("booking {} references unknown vehicle {}", id, vehicle_id));
    }

    let start = parse_flexible_date(&record[3])
        .ok_or_else(|| format!("unparsable start date '{}'", &record[3]))?;
    let end = parse_flexible_date(&record[4])
        .ok_or_else(|| format!("unparsable end date '{}'", &record[4]))?;
    let total_distance: u32 = record[5]
        .parse()
        .map_err(|_| format!("invalid total distance '{}'", &record[5]))?;

    let state = match record.get(6) {
        Some(raw) if !raw.is_empty() => BookingState::from_str(raw)?,
        _ => BookingState::Active,
    };
    if state == BookingState::Proposed {
        return Err(format!("booking {} was never confirmed", id));
    }

    let mut booking = Booking::new(id, customer_id, vehicle_id, start, end, total_distance);
    booking.state = state;
    Ok(booking)
}

fn vehicle_row(vehicle: &Vehicle) -> Vec<String> {
    vec![
        vehicle.id.clone(),
        vehicle.model.clone(),
        vehicle.category.to_string(),
        vehicle.daily_rate.to_string(),
        vehicle.status.to_string(),
    ]
}

fn customer_row(customer: &Customer) -> Vec<String> {
    vec![
        customer.id.clone(),
        customer.name.clone(),
        customer.contact_number.clone(),
        customer.email.clone(),
    ]
}

fn booking_row(booking: &Booking) -> Vec<String> {
    vec![
        booking.id.clone(),
        booking.customer_id.clone(),
        booking.vehicle_id.clone(),
        booking.start_date.format("%Y-%m-%d").to_string(),
        booking.end_date.format("%Y-%m-%d").to_string(),
        booking.total_distance.to_string(),
        booking.state.to_string(),
    ]
}
