//! # Configuration Management
//!
//! Loads generator, observer and debug-image settings from
//! `moon-config.toml`. Every section and field is optional; anything not set
//! keeps the built-in default, which reproduces the standard ten-year hourly
//! table for an observer in Paris.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::emit::OutputFormat;
use crate::provider::GeodeticLocation;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "moon-config.toml";

/// Application configuration loaded from moon-config.toml
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Table generation settings
    pub generator: GeneratorConfig,
    /// Observer used for the elevation column
    pub observer: ObserverConfig,
    /// Debug image settings
    pub debug: DebugConfig,
}

/// Table generation settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of samples (87600 = ten years of hours)
    pub count: usize,
    /// Seconds between samples
    pub period: u32,
    /// Include the moon elevation column
    pub with_elevation: bool,
    /// Shape of the generated declaration
    pub format: OutputFormat,
    /// Sample on all cores
    pub parallel: bool,
    /// Destination file; standard output when unset
    pub output: Option<PathBuf>,
}

/// Fixed ground observer
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Longitude in degrees, east positive
    pub longitude_deg: f64,
    /// Latitude in degrees, north positive
    pub latitude_deg: f64,
    /// Height above the WGS84 ellipsoid in meters
    pub height_m: f64,
}

/// Debug image layout
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Moon disk diameter in pixels
    pub cell_size: u32,
    /// Distance between neighbouring disks
    pub cell_spacing: u32,
    /// Number of days drawn by the daily-phases image
    pub days: u32,
    /// Step between synthetic angles in the angle grid
    pub angle_step_deg: u32,
    /// Where the PNG is written
    pub output: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 10 * 365 * 24,
            period: 3600,
            with_elevation: true,
            format: OutputFormat::DualArray,
            parallel: true,
            output: None,
        }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        // Paris
        Self {
            longitude_deg: 2.3522,
            latitude_deg: 48.8566,
            height_m: 35.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 1000,
            cell_size: 100,
            cell_spacing: 105,
            days: 30,
            angle_step_deg: 10,
            output: PathBuf::from("moon.png"),
        }
    }
}

impl ObserverConfig {
    pub fn location(&self) -> GeodeticLocation {
        GeodeticLocation {
            longitude_deg: self.longitude_deg,
            latitude_deg: self.latitude_deg,
            height_m: self.height_m,
        }
    }
}

impl Config {
    /// Load configuration from moon-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config file {}: {}", path.display(), e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!(
                    "No config file at {}, using default configuration",
                    path.display()
                );
                Self::default()
            }
        }
    }
}
