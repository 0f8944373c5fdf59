//! Simulated GPS tracking of packages
//!
//! Keeps a capped trail of position fixes per package code and derives the
//! speed between consecutive fixes from great-circle distance.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const DEFAULT_MAX_FIXES: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Fixes kept per package; older ones are dropped first
    pub max_fixes_per_package: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_fixes_per_package: DEFAULT_MAX_FIXES,
        }
    }
}

/// One recorded position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// km/h since the previous fix of the same package
    pub speed_kmh: f64,
}

/// A position report as read from a fixes file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FixReport {
    #[serde(alias = "codigo")]
    pub code: String,
    #[serde(alias = "lat", alias = "latitud")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "longitud")]
    pub longitude: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Great-circle distance in km between two `(lat, lng)` points in degrees
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[derive(Debug, Clone)]
pub struct GpsTracker {
    trails: HashMap<String, VecDeque<Fix>>,
    max_fixes: usize,
}

impl Default for GpsTracker {
    fn default() -> Self {
        Self::new(&TrackingConfig::default())
    }
}

impl GpsTracker {
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            trails: HashMap::new(),
            max_fixes: config.max_fixes_per_package.max(1),
        }
    }

    /// Record a position for `code` and return the stored fix
    pub fn update(
        &mut self,
        code: &str,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Fix, AppError> {
        if code.trim().is_empty() {
            return Err(AppError::InvalidInput("Package code cannot be empty".to_string()));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::InvalidInput(format!(
                "Latitude must be between -90 and 90, got {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::InvalidInput(format!(
                "Longitude must be between -180 and 180, got {}",
                longitude
            )));
        }

        let trail = self.trails.entry(code.to_string()).or_default();
        let speed_kmh = trail.back().map_or(0.0, |last| {
            let hours = (timestamp - last.timestamp).num_milliseconds() as f64 / 3_600_000.0;
            if hours > 0.0 {
                haversine_km((last.latitude, last.longitude), (latitude, longitude)) / hours
            } else {
                0.0
            }
        });

        let fix = Fix {
            latitude,
            longitude,
            timestamp,
            speed_kmh,
        };
        trail.push_back(fix.clone());
        while trail.len() > self.max_fixes {
            trail.pop_front();
        }

        debug!(
            "Fix for {}: ({}, {}) at {} km/h, {} kept",
            code,
            latitude,
            longitude,
            speed_kmh,
            trail.len()
        );
        Ok(fix)
    }

    /// Latest fix of a package
    pub fn current(&self, code: &str) -> Option<&Fix> {
        self.trails.get(code).and_then(|trail| trail.back())
    }

    /// `(lat, lng)` points oldest first; empty for unknown packages
    pub fn route(&self, code: &str) -> Vec<(f64, f64)> {
        self.trails
            .get(code)
            .map(|trail| trail.iter().map(|f| (f.latitude, f.longitude)).collect())
            .unwrap_or_default()
    }

    /// Path length over the kept fixes
    pub fn distance_km(&self, code: &str) -> f64 {
        self.route(code)
            .windows(2)
            .map(|pair| haversine_km(pair[0], pair[1]))
            .sum()
    }

    pub fn fixes(&self, code: &str) -> impl Iterator<Item = &Fix> {
        self.trails.get(code).into_iter().flatten()
    }

    /// Package codes with at least one fix, sorted
    pub fn packages(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.trails.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}
