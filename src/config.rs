//! Dashboard configuration.
//!
//! Read once at startup into a [`DashboardConfig`] that the rest of the
//! application consumes without touching the environment again.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::province::DEFAULT_RADIUS_KM;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "SEISMOTRACK_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "seismotrack.json";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Earthquake catalog (`.csv`, `.json` or `.parquet`).
    pub data_path: PathBuf,
    /// World-cities table used for province tagging.
    pub cities_path: PathBuf,
    /// Only cities of this country are indexed.
    pub country: String,
    /// Maximum great-circle distance to the nearest city, in km.
    pub province_radius_km: f64,
    /// Minimum spacing between two filter refreshes.
    pub refresh_cooldown_ms: u64,
    /// Rows shown in the recent-quakes table.
    pub recent_rows: usize,
    /// Bins in the magnitude histogram.
    pub histogram_bins: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/combined/combined.csv"),
            cities_path: PathBuf::from("data/worldcities.csv"),
            country: "Indonesia".to_string(),
            province_radius_km: DEFAULT_RADIUS_KM,
            refresh_cooldown_ms: 500,
            recent_rows: 10,
            histogram_bins: 20,
        }
    }
}

impl DashboardConfig {
    /// Load from `$SEISMOTRACK_CONFIG` or `./seismotrack.json`.
    ///
    /// A missing file gives the defaults; an unreadable one is logged and
    /// also gives the defaults.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config {}: {e:#}", path.display());
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).context("reading config file")?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("parsing config JSON")?;
        Ok(config.sanitized())
    }

    /// Replace nonsensical values with defaults.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.province_radius_km.is_finite() && self.province_radius_km > 0.0) {
            log::warn!(
                "province_radius_km must be positive, using {}",
                defaults.province_radius_km
            );
            self.province_radius_km = defaults.province_radius_km;
        }
        if self.histogram_bins == 0 {
            self.histogram_bins = defaults.histogram_bins;
        }
        self
    }

    pub fn refresh_cooldown(&self) -> Duration {
        Duration::from_millis(self.refresh_cooldown_ms)
    }
}
