//! TOML configuration loader with validation.
//!
//! Parses a [`SluiceConfig`] and checks it: parameter bounds of every
//! table, non-empty and unique station / gatehouse / gate names, positive
//! travel, plan values in range and a consistent pattern catalog.
//! Missing initial openings are left for the caller to seed.

use std::collections::HashSet;
use std::path::Path;

use sluice_common::config::{ConfigError, ConfigLoader, SharedConfig};
use sluice_common::gate::config::{
    ControlConfig, GateHouseConfig, PatternConfig, PatternRule, SluiceConfig, StationConfig,
    default_patterns,
};
use sluice_common::hydraulics::{DeviationBands, HydraulicModel};
use tracing::debug;

use crate::control::program::PatternCatalog;

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Complete validated configuration bundle, ready for runtime use.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub shared: SharedConfig,
    pub control: ControlConfig,
    pub hydraulics: HydraulicModel,
    pub bands: DeviationBands,
    pub catalog: PatternCatalog,
    pub stations: Vec<StationConfig>,
}

impl LoadedConfig {
    /// Number of gates across every station.
    pub fn gate_count(&self) -> usize {
        self.stations
            .iter()
            .flat_map(|s| &s.gatehouses)
            .map(|h| h.gates.len())
            .sum()
    }
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let raw = SluiceConfig::load(path)?;
    validate_config(raw)
}

/// Load config from a TOML string (for testing).
pub fn load_config_from_str(content: &str) -> Result<LoadedConfig, ConfigError> {
    let raw = SluiceConfig::load_str(content)?;
    validate_config(raw)
}

/// Validate an already parsed configuration.
///
/// An empty pattern list selects the built-in catalog.
pub fn validate_config(raw: SluiceConfig) -> Result<LoadedConfig, ConfigError> {
    raw.shared.validate()?;
    raw.control.validate().map_err(ConfigError::ValidationError)?;
    raw.hydraulics
        .validate()
        .map_err(ConfigError::ValidationError)?;
    raw.deviation_bands
        .validate()
        .map_err(ConfigError::ValidationError)?;

    let patterns = if raw.patterns.is_empty() {
        default_patterns()
    } else {
        raw.patterns
    };
    validate_patterns(&patterns)?;
    validate_stations(&raw.stations)?;

    let loaded = LoadedConfig {
        shared: raw.shared,
        control: raw.control,
        hydraulics: raw.hydraulics,
        bands: raw.deviation_bands,
        catalog: PatternCatalog::new(patterns),
        stations: raw.stations,
    };
    debug!(
        "Config validated: {} stations, {} gates, {} patterns",
        loaded.stations.len(),
        loaded.gate_count(),
        loaded.catalog.len()
    );
    Ok(loaded)
}

// ─── Validation ─────────────────────────────────────────────────────

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

fn check_name(kind: &str, name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(invalid(format!("{kind} name cannot be empty")));
    }
    Ok(())
}

fn validate_patterns(patterns: &[PatternConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for pattern in patterns {
        check_name("pattern", &pattern.id)?;
        if !seen.insert(pattern.id.as_str()) {
            return Err(invalid(format!("duplicate pattern id '{}'", pattern.id)));
        }
        match pattern.rule {
            PatternRule::Demand { fraction } => {
                if !(0.0..=1.0).contains(&fraction) {
                    return Err(invalid(format!(
                        "pattern '{}': demand fraction {fraction} out of range [0, 1]",
                        pattern.id
                    )));
                }
            }
            PatternRule::Formula { base_pct, gain } => {
                if !base_pct.is_finite() || !gain.is_finite() {
                    return Err(invalid(format!(
                        "pattern '{}': formula constants must be finite",
                        pattern.id
                    )));
                }
            }
            PatternRule::Hold => {}
        }
    }
    Ok(())
}

fn validate_stations(stations: &[StationConfig]) -> Result<(), ConfigError> {
    let mut station_names = HashSet::new();
    for station in stations {
        check_name("station", &station.name)?;
        if !station_names.insert(station.name.as_str()) {
            return Err(invalid(format!("duplicate station '{}'", station.name)));
        }

        let mut house_names = HashSet::new();
        for house in &station.gatehouses {
            check_name("gatehouse", &house.name)?;
            if !house_names.insert(house.name.as_str()) {
                return Err(invalid(format!(
                    "duplicate gatehouse '{}/{}'",
                    station.name, house.name
                )));
            }
            validate_gatehouse(&station.name, house)?;
        }
    }
    Ok(())
}

fn validate_gatehouse(station: &str, house: &GateHouseConfig) -> Result<(), ConfigError> {
    let path = format!("{station}/{}", house.name);
    if !(house.q_plan >= 0.0 && house.q_plan.is_finite()) {
        return Err(invalid(format!("{path}: q_plan {} must be >= 0", house.q_plan)));
    }
    if !(0.0..=1.0).contains(&house.k_target) {
        return Err(invalid(format!(
            "{path}: k_target {} out of range [0, 1]",
            house.k_target
        )));
    }
    if !(house.q_full_open > 0.0 && house.q_full_open.is_finite()) {
        return Err(invalid(format!(
            "{path}: q_full_open {} must be > 0",
            house.q_full_open
        )));
    }

    let mut gate_names = HashSet::new();
    for gate in &house.gates {
        check_name("gate", &gate.name)?;
        if !gate_names.insert(gate.name.as_str()) {
            return Err(invalid(format!("duplicate gate '{path}/{}'", gate.name)));
        }
        if !(gate.max_open_m > 0.0 && gate.max_open_m.is_finite()) {
            return Err(invalid(format!(
                "{path}/{}: max_open_m {} must be > 0",
                gate.name, gate.max_open_m
            )));
        }
    }
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────
