// Domain type definitions for the rental engines
// Provides the vehicle classification shared by pricing, availability and search

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Vehicle category
///
/// Every vehicle belongs to exactly one category. Pricing is configured
/// per category, and search filters match against the display name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    CompactPetrol,
    Hybrid,
    Electric,
    LuxurySuv,
    Racing,
    OffRoadSuv,
    SuperLuxury,
}

impl VehicleCategory {
    pub const ALL: [VehicleCategory; 7] = [
        VehicleCategory::CompactPetrol,
        VehicleCategory::Hybrid,
        VehicleCategory::Electric,
        VehicleCategory::LuxurySuv,
        VehicleCategory::Racing,
        VehicleCategory::OffRoadSuv,
        VehicleCategory::SuperLuxury,
    ];

    /// Human-readable name, also used in the flat-file records
    pub fn display_name(&self) -> &'static str {
        match self {
            VehicleCategory::CompactPetrol => "Compact Petrol",
            VehicleCategory::Hybrid => "Hybrid",
            VehicleCategory::Electric => "Electric",
            VehicleCategory::LuxurySuv => "Luxury SUV",
            VehicleCategory::Racing => "Racing",
            VehicleCategory::OffRoadSuv => "Off-road SUV",
            VehicleCategory::SuperLuxury => "Super Luxury",
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for VehicleCategory {
    type Err = String;

    /// Accepts the display name, the snake_case form, or any spacing and
    /// casing variant of either ("Off road SUV", "off_road_suv", "OFF-ROAD SUV").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "compactpetrol" => Ok(VehicleCategory::CompactPetrol),
            "hybrid" => Ok(VehicleCategory::Hybrid),
            "electric" => Ok(VehicleCategory::Electric),
            "luxurysuv" => Ok(VehicleCategory::LuxurySuv),
            "racing" => Ok(VehicleCategory::Racing),
            "offroadsuv" => Ok(VehicleCategory::OffRoadSuv),
            "superluxury" => Ok(VehicleCategory::SuperLuxury),
            _ => Err(format!("Invalid vehicle category: {}", s)),
        }
    }
}

/// Vehicle status
///
/// `Reserved` is maintained by the booking engine: a vehicle is reserved
/// while at least one active booking references it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Reserved,
    UnderMaintenance,
}

impl Default for VehicleStatus {
    fn default() -> Self {
        VehicleStatus::Available
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::Available => write!(f, "Available"),
            VehicleStatus::Reserved => write!(f, "Reserved"),
            VehicleStatus::UnderMaintenance => write!(f, "Under Maintenance"),
        }
    }
}

impl std::str::FromStr for VehicleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "available" => Ok(VehicleStatus::Available),
            "reserved" => Ok(VehicleStatus::Reserved),
            "undermaintenance" | "maintenance" => Ok(VehicleStatus::UnderMaintenance),
            _ => Err(format!("Invalid vehicle status: {}", s)),
        }
    }
}

/// Lowercase and drop separators so spelling variants compare equal
fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_category_display() {
        assert_eq!(VehicleCategory::CompactPetrol.to_string(), "Compact Petrol");
        assert_eq!(VehicleCategory::LuxurySuv.to_string(), "Luxury SUV");
        assert_eq!(VehicleCategory::OffRoadSuv.to_string(), "Off-road SUV");
    }

    #[test]
    fn test_category_from_str_accepts_variants() {
        assert_eq!(
            VehicleCategory::from_str("Luxury SUV").unwrap(),
            VehicleCategory::LuxurySuv
        );
        assert_eq!(
            VehicleCategory::from_str("off road suv").unwrap(),
            VehicleCategory::OffRoadSuv
        );
        assert_eq!(
            VehicleCategory::from_str("Super luxury").unwrap(),
            VehicleCategory::SuperLuxury
        );
        assert_eq!(
            VehicleCategory::from_str("compact_petrol").unwrap(),
            VehicleCategory::CompactPetrol
        );
        assert!(VehicleCategory::from_str("Spaceship").is_err());
    }

    #[test]
    fn test_category_display_round_trips() {
        for category in VehicleCategory::ALL {
            assert_eq!(
                VehicleCategory::from_str(&category.to_string()).unwrap(),
                category
            );
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            VehicleStatus::from_str("Available").unwrap(),
            VehicleStatus::Available
        );
        assert_eq!(
            VehicleStatus::from_str("RESERVED").unwrap(),
            VehicleStatus::Reserved
        );
        assert_eq!(
            VehicleStatus::from_str("Under Maintenance").unwrap(),
            VehicleStatus::UnderMaintenance
        );
        assert!(VehicleStatus::from_str("Stolen").is_err());
    }

    #[test]
    fn test_status_default() {
        assert_eq!(VehicleStatus::default(), VehicleStatus::Available);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&VehicleCategory::LuxurySuv).unwrap();
        assert_eq!(json, "\"luxury_suv\"");

        let json = serde_json::to_string(&VehicleStatus::UnderMaintenance).unwrap();
        assert_eq!(json, "\"under_maintenance\"");

        let status: VehicleStatus = serde_json::from_str("\"reserved\"").unwrap();
        assert_eq!(status, VehicleStatus::Reserved);
    }
}
