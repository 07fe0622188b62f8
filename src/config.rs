// Application configuration
//
// Read once at startup from the process environment (after `.env` has been
// loaded). Every variable has a default except `PRICING_FILE`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding vehicles.csv, customers.csv and bookings.csv
    pub data_dir: PathBuf,
    /// Default filter directive when RUST_LOG is not set
    pub log_level: String,
    /// JSON pricing table replacing the built-in rates
    pub pricing_file: Option<PathBuf>,
    /// Add the sample fleet when no vehicles were loaded
    pub seed_sample_vehicles: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            pricing_file: None,
            seed_sample_vehicles: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                name: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.port,
        };

        let seed_sample_vehicles = match get("SEED_SAMPLE_VEHICLES") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                name: "SEED_SAMPLE_VEHICLES",
                value: raw.clone(),
                reason: "expected true or false".to_string(),
            })?,
            None => defaults.seed_sample_vehicles,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            pricing_file: get("PRICING_FILE").map(PathBuf::from),
            seed_sample_vehicles,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("DATA_DIR", "/var/lib/ecoride"),
            ("RUST_LOG", "debug"),
            ("PRICING_FILE", "pricing.json"),
            ("SEED_SAMPLE_VEHICLES", "no"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/ecoride"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.pricing_file, Some(PathBuf::from("pricing.json")));
        assert!(!config.seed_sample_vehicles);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("PORT", "eighty")])),
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("SEED_SAMPLE_VEHICLES", "maybe")])),
            Err(ConfigError::InvalidValue { name: "SEED_SAMPLE_VEHICLES", .. })
        ));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("HOST", "  "), ("PORT", "")])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
    }
}
