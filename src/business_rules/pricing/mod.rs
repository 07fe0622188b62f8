// Pricing Engine
//
// Computes rental charges from a per-category pricing table.
// A charge is the base price for the rental days, a long-rental discount,
// an extra-distance charge beyond the free allowance, tax, and a flat deposit.

use crate::business_rules::{
    error::{BRResult, BusinessRulesError},
    types::VehicleCategory,
};
use crate::rental::models::{Booking, Customer, Vehicle};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use utoipa::ToSchema;

/// Rentals of at least this many days get the long-rental discount
pub const LONG_RENTAL_DAYS: i64 = 7;

/// Flat refundable deposit collected with every priced booking
pub fn security_deposit() -> Decimal {
    Decimal::from(5000)
}

/// Discount applied to the base price of long rentals (10%)
pub fn long_rental_discount_rate() -> Decimal {
    Decimal::new(10, 2)
}

/// Pricing for one vehicle category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PricingRule {
    pub category: VehicleCategory,
    pub daily_rate: Decimal,
    /// Kilometres included per rental day
    pub free_distance_per_day: u32,
    /// Charge per kilometre beyond the free allowance
    pub extra_distance_rate: Decimal,
    /// Fraction in [0, 1], e.g. 0.12
    pub tax_rate: Decimal,
}

impl PricingRule {
    pub fn new(
        category: VehicleCategory,
        daily_rate: i64,
        free_distance_per_day: u32,
        extra_distance_rate: i64,
        tax_percent: i64,
    ) -> Self {
        Self {
            category,
            daily_rate: Decimal::from(daily_rate),
            free_distance_per_day,
            extra_distance_rate: Decimal::from(extra_distance_rate),
            tax_rate: Decimal::new(tax_percent, 2),
        }
    }

    fn validate(&self) -> BRResult<()> {
        if self.daily_rate.is_sign_negative() {
            return Err(BusinessRulesError::InvalidPricingRule(format!(
                "daily rate for {} must not be negative",
                self.category
            )));
        }
        if self.extra_distance_rate.is_sign_negative() {
            return Err(BusinessRulesError::InvalidPricingRule(format!(
                "extra distance rate for {} must not be negative",
                self.category
            )));
        }
        if self.tax_rate.is_sign_negative() || self.tax_rate > Decimal::ONE {
            return Err(BusinessRulesError::InvalidPricingRule(format!(
                "tax rate for {} must be between 0 and 1",
                self.category
            )));
        }
        Ok(())
    }
}

/// Category -> pricing rule lookup
///
/// Categories without a rule are "unpriced": charges for them come back zeroed
/// with the `unpriced` flag set instead of failing.
#[derive(Debug, Clone)]
pub struct PricingTable {
    rules: HashMap<VehicleCategory, PricingRule>,
}

impl Default for PricingTable {
    fn default() -> Self {
        let rules = [
            PricingRule::new(VehicleCategory::CompactPetrol, 5000, 100, 50, 10),
            PricingRule::new(VehicleCategory::Hybrid, 7500, 150, 60, 12),
            PricingRule::new(VehicleCategory::Electric, 10000, 200, 40, 8),
            PricingRule::new(VehicleCategory::LuxurySuv, 15000, 250, 75, 15),
            PricingRule::new(VehicleCategory::Racing, 25000, 250, 75, 15),
            PricingRule::new(VehicleCategory::OffRoadSuv, 20000, 250, 75, 15),
            PricingRule::new(VehicleCategory::SuperLuxury, 35000, 250, 75, 15),
        ];

        Self {
            rules: rules.into_iter().map(|rule| (rule.category, rule)).collect(),
        }
    }
}

impl PricingTable {
    /// Build a table from an explicit rule list
    ///
    /// Rejects negative values, tax rates above 1, and duplicate categories.
    pub fn from_rules(rules: Vec<PricingRule>) -> BRResult<Self> {
        let mut table = HashMap::with_capacity(rules.len());

        for rule in rules {
            rule.validate()?;
            let category = rule.category;
            if table.insert(category, rule).is_some() {
                return Err(BusinessRulesError::InvalidPricingRule(format!(
                    "category {} is configured more than once",
                    category
                )));
            }
        }

        Ok(Self { rules: table })
    }

    /// Load a JSON array of rules from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> BRResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let rules: Vec<PricingRule> = serde_json::from_str(&raw)?;
        tracing::info!(
            "Loaded {} pricing rules from {}",
            rules.len(),
            path.as_ref().display()
        );
        Self::from_rules(rules)
    }

    pub fn rule_for(&self, category: VehicleCategory) -> Option<&PricingRule> {
        self.rules.get(&category)
    }

    /// All configured rules in category order
    pub fn rules(&self) -> Vec<&PricingRule> {
        let mut rules: Vec<&PricingRule> = self.rules.values().collect();
        rules.sort_by_key(|rule| rule.category);
        rules
    }
}

/// Itemised charge for one booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChargeBreakdown {
    pub category: VehicleCategory,
    pub days: i64,
    pub daily_rate: Decimal,
    pub base_price: Decimal,
    pub discount: Decimal,
    pub free_distance: u64,
    pub actual_distance: u32,
    pub extra_distance: u64,
    pub extra_distance_charge: Decimal,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub deposit: Decimal,
    pub total: Decimal,
    /// No pricing rule exists for the category
    pub unpriced: bool,
}

impl ChargeBreakdown {
    fn zeroed(category: VehicleCategory, days: i64, actual_distance: u32, unpriced: bool) -> Self {
        Self {
            category,
            days,
            daily_rate: Decimal::ZERO,
            base_price: Decimal::ZERO,
            discount: Decimal::ZERO,
            free_distance: 0,
            actual_distance,
            extra_distance: 0,
            extra_distance_charge: Decimal::ZERO,
            subtotal: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            tax: Decimal::ZERO,
            deposit: Decimal::ZERO,
            total: Decimal::ZERO,
            unpriced,
        }
    }

    /// Total minus the refundable deposit
    pub fn amount_due_now(&self) -> Decimal {
        self.total - self.deposit
    }
}

/// Customer-facing invoice for a booking, priced at its planned distance
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Invoice {
    pub booking_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub vehicle_id: String,
    pub vehicle_model: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub charge: ChargeBreakdown,
    pub total_payable: Decimal,
}

/// Fee calculator
///
/// Stateless apart from its pricing table. All arithmetic is decimal.
#[derive(Debug, Clone, Default)]
pub struct FeeCalculator {
    table: PricingTable,
}

impl FeeCalculator {
    pub fn new(table: PricingTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PricingTable {
        &self.table
    }

    /// Price a rental of `days` days in `category` covering `actual_distance` km
    ///
    /// 1. base = daily rate x days, less 10% when days >= 7
    /// 2. extra km beyond (free km/day x days) at the extra rate
    /// 3. tax on (discounted base + extra charge)
    /// 4. total = subtotal + tax + deposit
    ///
    /// Non-positive durations and unpriced categories yield an all-zero breakdown.
    pub fn quote(&self, category: VehicleCategory, days: i64, actual_distance: u32) -> ChargeBreakdown {
        let rule = match self.table.rule_for(category) {
            Some(rule) => rule,
            None => return ChargeBreakdown::zeroed(category, days, actual_distance, true),
        };
        if days <= 0 {
            return ChargeBreakdown::zeroed(category, days, actual_distance, false);
        }

        let day_count = Decimal::from(days);
        let base_price = rule.daily_rate * day_count;
        let discount = if days >= LONG_RENTAL_DAYS {
            base_price * long_rental_discount_rate()
        } else {
            Decimal::ZERO
        };

        let free_distance = u64::from(rule.free_distance_per_day) * days as u64;
        let extra_distance = u64::from(actual_distance).saturating_sub(free_distance);
        let extra_distance_charge = rule.extra_distance_rate * Decimal::from(extra_distance);

        let subtotal = base_price - discount + extra_distance_charge;
        let tax = subtotal * rule.tax_rate;
        let deposit = security_deposit();

        ChargeBreakdown {
            category,
            days,
            daily_rate: rule.daily_rate,
            base_price,
            discount,
            free_distance,
            actual_distance,
            extra_distance,
            extra_distance_charge,
            subtotal,
            tax_rate: rule.tax_rate,
            tax,
            deposit,
            total: subtotal + tax + deposit,
            unpriced: false,
        }
    }

    /// Charge for a booking given the distance actually driven
    pub fn compute_charge(
        &self,
        booking: &Booking,
        category: VehicleCategory,
        actual_distance: u32,
    ) -> ChargeBreakdown {
        self.quote(category, booking.duration_in_days(), actual_distance)
    }

    /// Charge for a booking at its planned distance
    pub fn estimate(&self, booking: &Booking, category: VehicleCategory) -> ChargeBreakdown {
        self.compute_charge(booking, category, booking.total_distance)
    }

    pub fn invoice(&self, booking: &Booking, customer: &Customer, vehicle: &Vehicle) -> Invoice {
        let charge = self.estimate(booking, vehicle.category);
        let total_payable = charge.amount_due_now();

        Invoice {
            booking_id: booking.id.clone(),
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            vehicle_id: vehicle.id.clone(),
            vehicle_model: vehicle.model.clone(),
            start_date: booking.start_date,
            end_date: booking.end_date,
            charge,
            total_payable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn booking(start: NaiveDate, end: NaiveDate, distance: u32) -> Booking {
        Booking::new("B001", "C001", "V001", start, end, distance)
    }

    #[test]
    fn test_default_table_has_every_category() {
        let table = PricingTable::default();
        for category in VehicleCategory::ALL {
            assert!(table.rule_for(category).is_some(), "missing {}", category);
        }

        let hybrid = table.rule_for(VehicleCategory::Hybrid).unwrap();
        assert_eq!(hybrid.daily_rate, dec!(7500));
        assert_eq!(hybrid.free_distance_per_day, 150);
        assert_eq!(hybrid.extra_distance_rate, dec!(60));
        assert_eq!(hybrid.tax_rate, dec!(0.12));
    }

    #[test]
    fn test_week_long_hybrid_with_extra_distance() {
        let calculator = FeeCalculator::default();
        let booking = booking(date(2025, 3, 10), date(2025, 3, 16), 900);

        let charge = calculator.compute_charge(&booking, VehicleCategory::Hybrid, 1200);

        assert_eq!(charge.days, 7);
        assert_eq!(charge.base_price, dec!(52500));
        assert_eq!(charge.discount, dec!(5250));
        assert_eq!(charge.free_distance, 1050);
        assert_eq!(charge.extra_distance, 150);
        assert_eq!(charge.extra_distance_charge, dec!(9000));
        assert_eq!(charge.subtotal, dec!(56250));
        assert_eq!(charge.tax, dec!(6750));
        assert_eq!(charge.deposit, dec!(5000));
        assert_eq!(charge.total, dec!(68000));
        assert_eq!(charge.amount_due_now(), dec!(63000));
        assert!(!charge.unpriced);
    }

    #[test]
    fn test_ten_day_luxury_suv() {
        let calculator = FeeCalculator::default();
        let booking = booking(date(2025, 6, 1), date(2025, 6, 10), 3000);

        let charge = calculator.estimate(&booking, VehicleCategory::LuxurySuv);

        assert_eq!(charge.base_price, dec!(150000));
        assert_eq!(charge.discount, dec!(15000));
        assert_eq!(charge.free_distance, 2500);
        assert_eq!(charge.extra_distance_charge, dec!(37500));
        assert_eq!(charge.subtotal, dec!(172500));
        assert_eq!(charge.tax, dec!(25875));
        assert_eq!(charge.total, dec!(203375));
    }

    #[test]
    fn test_short_rental_has_no_discount() {
        let calculator = FeeCalculator::default();
        let charge = calculator.quote(VehicleCategory::Electric, 6, 0);

        assert_eq!(charge.base_price, dec!(60000));
        assert_eq!(charge.discount, Decimal::ZERO);
        assert_eq!(charge.extra_distance, 0);
        assert_eq!(charge.tax, dec!(4800));
        assert_eq!(charge.total, dec!(69800));
    }

    #[test]
    fn test_inverted_range_is_all_zero() {
        let calculator = FeeCalculator::default();
        let inverted = booking(date(2025, 3, 10), date(2025, 3, 9), 500);

        let charge = calculator.estimate(&inverted, VehicleCategory::Hybrid);

        assert_eq!(charge.days, 0);
        assert_eq!(charge.total, Decimal::ZERO);
        assert_eq!(charge.deposit, Decimal::ZERO);
        assert!(!charge.unpriced);
    }

    #[test]
    fn test_unpriced_category_is_flagged() {
        let table = PricingTable::from_rules(vec![PricingRule::new(
            VehicleCategory::Hybrid,
            7500,
            150,
            60,
            12,
        )])
        .unwrap();
        let calculator = FeeCalculator::new(table);

        let charge = calculator.quote(VehicleCategory::Racing, 5, 100);

        assert!(charge.unpriced);
        assert_eq!(charge.total, Decimal::ZERO);
        assert_eq!(charge.base_price, Decimal::ZERO);
    }

    #[test]
    fn test_invoice_total_excludes_deposit() {
        let calculator = FeeCalculator::default();
        let booking = booking(date(2025, 3, 10), date(2025, 3, 11), 0);
        let customer = Customer::new("C001", "Nimal Perera", "0771234567", "nimal@example.com");
        let vehicle = Vehicle::new(
            "V001",
            "Toyota Aqua",
            VehicleCategory::Hybrid,
            dec!(7500),
            crate::business_rules::VehicleStatus::Reserved,
        );

        let invoice = calculator.invoice(&booking, &customer, &vehicle);

        assert_eq!(invoice.customer_name, "Nimal Perera");
        assert_eq!(invoice.charge.total, dec!(21800));
        assert_eq!(invoice.total_payable, dec!(16800));
    }

    #[test]
    fn test_from_rules_rejects_bad_values() {
        let mut negative = PricingRule::new(VehicleCategory::Hybrid, 7500, 150, 60, 12);
        negative.daily_rate = dec!(-1);
        assert!(matches!(
            PricingTable::from_rules(vec![negative]),
            Err(BusinessRulesError::InvalidPricingRule(_))
        ));

        let mut taxed = PricingRule::new(VehicleCategory::Hybrid, 7500, 150, 60, 12);
        taxed.tax_rate = dec!(1.5);
        assert!(PricingTable::from_rules(vec![taxed]).is_err());

        let duplicate = vec![
            PricingRule::new(VehicleCategory::Hybrid, 7500, 150, 60, 12),
            PricingRule::new(VehicleCategory::Hybrid, 8000, 150, 60, 12),
        ];
        assert!(PricingTable::from_rules(duplicate).is_err());
    }

    #[test]
    fn test_rules_deserialize_from_json() {
        let raw = r#"[
            {"category": "electric", "daily_rate": "9000", "free_distance_per_day": 180,
             "extra_distance_rate": "35", "tax_rate": "0.08"}
        ]"#;
        let rules: Vec<PricingRule> = serde_json::from_str(raw).unwrap();
        let table = PricingTable::from_rules(rules).unwrap();

        let electric = table.rule_for(VehicleCategory::Electric).unwrap();
        assert_eq!(electric.daily_rate, dec!(9000));
        assert!(table.rule_for(VehicleCategory::Hybrid).is_none());
    }
}
