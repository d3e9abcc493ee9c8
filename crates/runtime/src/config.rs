//! Per-mount visualization configuration.
//!
//! A config is derived from the [`DeviceClass`] once at mount, optionally
//! patched by a JSON document from the host, validated, and then read-only for
//! the rest of the mount.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::device::DeviceClass;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config overrides must be a JSON object")]
    NotAnObject,
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Which side of the brightness threshold counts as land.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandPolarity {
    /// Land is darker than the threshold (sample < threshold).
    DarkIsLand,
    /// Land is brighter than the threshold (sample > threshold).
    BrightIsLand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisualizationConfig {
    pub device: DeviceClass,

    // Point field
    pub point_count: usize,
    pub point_size: f32,
    pub point_color: [f32; 3],
    pub globe_radius: f64,
    pub surface_offset: f64,

    // Land mask
    pub raster_url: Option<String>,
    pub raster_timeout_ms: u32,
    pub land_threshold: u8,
    pub land_polarity: LandPolarity,

    // Routes
    pub max_concurrent_routes: usize,
    pub spawn_threshold: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    pub retirement_threshold: f64,
    pub trail_length: f32,
    pub altitude_factor: f64,
    pub min_route_distance_ratio: f64,
    pub tube_radius: f64,
    pub tube_segments: u32,
    pub radial_segments: u32,
    pub colors: Vec<[f32; 3]>,

    // Scheduling
    pub visibility_threshold: f64,
}

impl VisualizationConfig {
    pub fn for_device(device: DeviceClass) -> Self {
        let constrained = device.is_constrained();
        Self {
            device,
            point_count: if constrained { 6_000 } else { 15_000 },
            point_size: if constrained { 0.045 } else { 0.03 },
            point_color: [0.55, 0.75, 1.0],
            globe_radius: 1.0,
            surface_offset: 0.01,
            raster_url: None,
            raster_timeout_ms: 8_000,
            land_threshold: 100,
            land_polarity: LandPolarity::DarkIsLand,
            max_concurrent_routes: if constrained { 5 } else { 12 },
            spawn_threshold: 0.985,
            speed_min: 0.0015,
            speed_max: 0.003,
            retirement_threshold: if constrained { 1.4 } else { 1.5 },
            trail_length: 0.45,
            altitude_factor: 0.55,
            min_route_distance_ratio: 0.4,
            tube_radius: 0.004,
            tube_segments: if constrained { 24 } else { 64 },
            radial_segments: if constrained { 6 } else { 8 },
            colors: vec![[0.30, 0.85, 1.0], [1.0, 0.62, 0.25], [0.70, 0.50, 1.0]],
            visibility_threshold: 0.1,
        }
    }

    /// Device defaults patched by the keys present in `json`.
    pub fn from_json_overrides(device: DeviceClass, json: &str) -> Result<Self, ConfigError> {
        let overrides: Value = serde_json::from_str(json)?;
        let Value::Object(overrides) = overrides else {
            return Err(ConfigError::NotAnObject);
        };

        let mut merged = serde_json::to_value(Self::for_device(device))?;
        if let Value::Object(base) = &mut merged {
            base.extend(overrides);
        }

        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Absolute minimum chord length for a route between two land points.
    pub fn min_route_distance(&self) -> f64 {
        self.globe_radius * self.min_route_distance_ratio
    }

    /// Radius land points are placed at.
    pub fn land_radius(&self) -> f64 {
        self.globe_radius + self.surface_offset
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.point_count == 0 {
            return Err(ConfigError::Invalid("point_count must be at least 1"));
        }
        if !(self.globe_radius > 0.0) {
            return Err(ConfigError::Invalid("globe_radius must be positive"));
        }
        if self.colors.is_empty() {
            return Err(ConfigError::Invalid("colors must not be empty"));
        }
        if self.tube_segments < 2 {
            return Err(ConfigError::Invalid("tube_segments must be at least 2"));
        }
        if self.radial_segments < 3 {
            return Err(ConfigError::Invalid("radial_segments must be at least 3"));
        }
        if !(self.speed_min > 0.0) || self.speed_min > self.speed_max {
            return Err(ConfigError::Invalid("speed range must be positive and ordered"));
        }
        if !(self.retirement_threshold >= 1.0) {
            return Err(ConfigError::Invalid("retirement_threshold must be at least 1.0"));
        }
        if !(0.0..1.0).contains(&self.spawn_threshold) {
            return Err(ConfigError::Invalid("spawn_threshold must be in [0, 1)"));
        }
        if !(self.visibility_threshold > 0.0 && self.visibility_threshold <= 1.0) {
            return Err(ConfigError::Invalid("visibility_threshold must be in (0, 1]"));
        }
        Ok(())
    }
}
