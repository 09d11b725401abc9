//! Cleaner settings
//!
//! Clearance thresholds (millimeters) and rule toggles as edited by the user,
//! persisted as JSON. Missing fields take their defaults; `validate` turns the
//! settings into the engine's nanometer thresholds.

use crate::board::from_mm;
use crate::clean::{ClearanceThresholds, RuleSet};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Smallest accepted grid cell size; finer cells only multiply index entries
pub const MIN_CELL_SIZE_MM: f64 = 0.05;

/// Invalid user configuration, reported before any geometry work
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("'{value}' is not a valid number")]
    InvalidNumber { value: String },
    #[error("{field} must be a non-negative number, got {value}")]
    InvalidThreshold { field: &'static str, value: f64 },
    #[error("cell size must be at least 0.05 mm, got {value} mm")]
    InvalidCellSize { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanerSettings {
    #[serde(default = "default_min_clearance")]
    pub min_clearance_mm: f64,
    #[serde(default = "default_board_edge_clearance")]
    pub board_edge_clearance_mm: f64,
    #[serde(default = "default_zone_clearance")]
    pub zone_clearance_mm: f64,
    #[serde(default = "default_enabled")]
    pub check_components: bool,
    #[serde(default = "default_enabled")]
    pub check_nets: bool,
    #[serde(default = "default_enabled")]
    pub check_board_edge: bool,
    #[serde(default = "default_enabled")]
    pub check_zones: bool,
    #[serde(default = "default_enabled")]
    pub check_outside_board: bool,
    /// Spatial grid cell size
    #[serde(default = "default_cell_size")]
    pub cell_size_mm: f64,
}

impl Default for CleanerSettings {
    fn default() -> Self {
        Self {
            min_clearance_mm: default_min_clearance(),
            board_edge_clearance_mm: default_board_edge_clearance(),
            zone_clearance_mm: default_zone_clearance(),
            check_components: default_enabled(),
            check_nets: default_enabled(),
            check_board_edge: default_enabled(),
            check_zones: default_enabled(),
            check_outside_board: default_enabled(),
            cell_size_mm: default_cell_size(),
        }
    }
}

fn default_min_clearance() -> f64 {
    0.2
}
fn default_board_edge_clearance() -> f64 {
    0.3
}
fn default_zone_clearance() -> f64 {
    0.2
}
fn default_enabled() -> bool {
    true
}
fn default_cell_size() -> f64 {
    1.0
}

impl CleanerSettings {
    /// Read settings from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        Ok(settings)
    }

    /// Read settings, falling back to defaults when absent or unreadable
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("Settings file {} not found, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(())
    }

    pub fn rules(&self) -> RuleSet {
        RuleSet {
            check_components: self.check_components,
            check_nets: self.check_nets,
            check_board_edge: self.check_board_edge,
            check_zones: self.check_zones,
            check_outside_board: self.check_outside_board,
        }
    }

    /// Check every value and convert to engine units
    ///
    /// Returns thresholds in nanometers, the rule set and the grid cell size
    /// in nanometers.
    pub fn validate(&self) -> Result<(ClearanceThresholds, RuleSet, i64), ConfigError> {
        let thresholds = [
            ("min_clearance_mm", self.min_clearance_mm),
            ("board_edge_clearance_mm", self.board_edge_clearance_mm),
            ("zone_clearance_mm", self.zone_clearance_mm),
        ];
        for (field, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold { field, value });
            }
        }

        let cell_size = from_mm(self.cell_size_mm).round();
        if !cell_size.is_finite() || self.cell_size_mm < MIN_CELL_SIZE_MM {
            return Err(ConfigError::InvalidCellSize {
                value: self.cell_size_mm,
            });
        }

        Ok((
            ClearanceThresholds::from_mm(
                self.min_clearance_mm,
                self.board_edge_clearance_mm,
                self.zone_clearance_mm,
            ),
            self.rules(),
            cell_size as i64,
        ))
    }
}

/// Parse a threshold typed by the user (millimeters, non-negative)
pub fn parse_threshold(text: &str) -> Result<f64, ConfigError> {
    let value: f64 = text.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        value: text.to_string(),
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidThreshold {
            field: "clearance",
            value,
        });
    }
    Ok(value)
}

/// Partial settings change; `None` fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub min_clearance_mm: Option<f64>,
    pub board_edge_clearance_mm: Option<f64>,
    pub zone_clearance_mm: Option<f64>,
    pub check_components: Option<bool>,
    pub check_nets: Option<bool>,
    pub check_board_edge: Option<bool>,
    pub check_zones: Option<bool>,
    pub check_outside_board: Option<bool>,
    pub cell_size_mm: Option<f64>,
}

impl SettingsUpdate {
    /// Apply onto `base`, returning the merged settings
    pub fn apply(&self, base: &CleanerSettings) -> CleanerSettings {
        CleanerSettings {
            min_clearance_mm: self.min_clearance_mm.unwrap_or(base.min_clearance_mm),
            board_edge_clearance_mm: self
                .board_edge_clearance_mm
                .unwrap_or(base.board_edge_clearance_mm),
            zone_clearance_mm: self.zone_clearance_mm.unwrap_or(base.zone_clearance_mm),
            check_components: self.check_components.unwrap_or(base.check_components),
            check_nets: self.check_nets.unwrap_or(base.check_nets),
            check_board_edge: self.check_board_edge.unwrap_or(base.check_board_edge),
            check_zones: self.check_zones.unwrap_or(base.check_zones),
            check_outside_board: self.check_outside_board.unwrap_or(base.check_outside_board),
            cell_size_mm: self.cell_size_mm.unwrap_or(base.cell_size_mm),
        }
    }
}
