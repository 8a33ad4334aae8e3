//! Configuration models and loaders for commercial mission sizing.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Segment counts as written in mission files, keyed by phase name.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SegmentsConfig {
    pub takeoff: i64,
    pub climb1: i64,
    pub transition: i64,
    pub climb2: i64,
    pub cruise1: i64,
    pub cruise_climb: i64,
    pub cruise2: i64,
    pub descent: i64,
    pub landing: i64,
    pub reserve_climb: i64,
    pub reserve_descent: i64,
    pub reserve_landing: i64,
    pub reserve_hold: i64,
}

impl Default for SegmentsConfig {
    fn default() -> Self {
        Self {
            takeoff: 0,
            climb1: 3,
            transition: 0,
            climb2: 3,
            cruise1: 0,
            cruise_climb: 0,
            cruise2: 3,
            descent: 0,
            landing: 0,
            reserve_climb: 0,
            reserve_descent: 0,
            reserve_landing: 0,
            reserve_hold: 0,
        }
    }
}

/// Mission requirements and the altitude/speed schedule of the flight profile.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProfileConfig {
    pub range_miles: f64,
    /// Altitude where the climb profile starts.
    pub start_altitude_ft: f64,
    /// Altitude reached at the end of the first climb (250 kt limit below it).
    pub climb1_ceiling_ft: f64,
    pub cruise_altitude_ft: f64,
    pub climb1_speed_limit_kts: f64,
    pub climb2_speed_limit_kts: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            range_miles: 3_000.0,
            start_altitude_ft: 1_500.0,
            climb1_ceiling_ft: 10_000.0,
            cruise_altitude_ft: 35_000.0,
            climb1_speed_limit_kts: 250.0,
            climb2_speed_limit_kts: 500.0,
        }
    }
}

/// Airframe and engine constants.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AircraftConfig {
    pub empty_weight_n: f64,
    pub payload_weight_n: f64,
    pub wing_area_m2: f64,
    pub cd0: f64,
    /// Induced-drag factor of the parabolic drag polar.
    pub k: f64,
    pub ld_max: f64,
    pub stall_speed_kts: f64,
    pub thrust_n: f64,
    /// Climb TSFC in lb/lbf/hr.
    pub climb_tsfc: f64,
}

impl Default for AircraftConfig {
    fn default() -> Self {
        Self {
            empty_weight_n: 40_000.0,
            payload_weight_n: 400_000.0,
            wing_area_m2: 124.58,
            cd0: 0.025,
            k: 0.045,
            ld_max: 15.0,
            stall_speed_kts: 120.0,
            thrust_n: 200_000.0,
            climb_tsfc: 2.0,
        }
    }
}

/// Fixed cruise conditions.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CruiseConfig {
    /// TSFC in lb/lbf/hr.
    pub tsfc: f64,
    pub lift_to_drag: f64,
    pub speed_kts: f64,
}

impl Default for CruiseConfig {
    fn default() -> Self {
        Self {
            tsfc: 1.4,
            lift_to_drag: 10.0,
            speed_kts: 420.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AtmosphereConfig {
    /// Air density held during every climb segment.
    pub climb_density_kg_m3: f64,
    pub temperature_k: f64,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            climb_density_kg_m3: 1.225,
            temperature_k: 273.0,
        }
    }
}

/// A complete mission definition. Every section falls back to the baseline tube-and-wing values.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MissionConfig {
    pub name: String,
    pub segments: SegmentsConfig,
    pub profile: ProfileConfig,
    pub aircraft: AircraftConfig,
    pub cruise: CruiseConfig,
    pub atmosphere: AtmosphereConfig,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            name: "baseline".to_string(),
            segments: SegmentsConfig::default(),
            profile: ProfileConfig::default(),
            aircraft: AircraftConfig::default(),
            cruise: CruiseConfig::default(),
            atmosphere: AtmosphereConfig::default(),
        }
    }
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("no mission definitions found in {0}")]
    Empty(PathBuf),
}

/// Load one mission from a YAML or TOML file.
pub fn load_mission<P: AsRef<Path>>(path: P) -> Result<MissionConfig, ConfigError> {
    let path = path.as_ref();
    if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Load every mission under `path`: a single file, or a directory of `.toml`/`.yaml` files
/// read in name order.
pub fn load_missions<P: AsRef<Path>>(path: P) -> Result<Vec<MissionConfig>, ConfigError> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Ok(vec![load_mission(path)?]);
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_toml(p) || is_yaml(p))
        .collect();
    entries.sort();
    if entries.is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }
    entries.iter().map(load_mission).collect()
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
}
