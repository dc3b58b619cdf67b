use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Parameters of the space-colonization algorithm.
///
/// All distances are in world units. Every field has a default, so a host
/// can deserialize a partial document and override only what it needs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Radius within which an attractor pulls on its nearest node.
    pub attraction_distance: f32,
    /// Distance at which an attractor counts as reached and is consumed.
    pub kill_distance: f32,
    /// Length of one growth segment.
    pub segment_length: f32,
    /// Radius of freshly grown nodes.
    pub minimum_radius: f32,
    /// Upper bound for any node radius.
    pub maximum_radius: f32,
    /// Radius added to every ancestor per new descendant when canalization is on.
    pub radius_increment: f32,
    pub enable_canalization: bool,
    /// Attractors older than this are removed. Ignored unless aging is enabled.
    pub max_attractor_age: u32,
    pub enable_attractor_aging: bool,
    pub bounds_enabled: bool,
    pub obstacles_enabled: bool,
    /// Maximum per-axis offset added to growth candidates; `0.0` disables jitter.
    pub jitter: f32,
    pub jitter_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            attraction_distance: 50.0,
            kill_distance: 20.0,
            segment_length: 10.0,
            minimum_radius: 1.0,
            maximum_radius: 5.0,
            radius_increment: 0.05,
            enable_canalization: true,
            max_attractor_age: 100,
            enable_attractor_aging: false,
            bounds_enabled: false,
            obstacles_enabled: false,
            jitter: 0.0,
            jitter_seed: 0,
        }
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

impl Config {
    /// Checks every range constraint and returns the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !positive(self.attraction_distance) {
            return Err(ConfigError::AttractionDistance(self.attraction_distance));
        }
        if !positive(self.kill_distance) {
            return Err(ConfigError::KillDistance(self.kill_distance));
        }
        if self.kill_distance > self.attraction_distance {
            return Err(ConfigError::KillExceedsAttraction {
                kill: self.kill_distance,
                attraction: self.attraction_distance,
            });
        }
        if !positive(self.segment_length) {
            return Err(ConfigError::SegmentLength(self.segment_length));
        }
        if !positive(self.minimum_radius)
            || !self.maximum_radius.is_finite()
            || self.minimum_radius > self.maximum_radius
        {
            return Err(ConfigError::RadiusRange {
                minimum: self.minimum_radius,
                maximum: self.maximum_radius,
            });
        }
        if !positive(self.radius_increment) {
            return Err(ConfigError::RadiusIncrement(self.radius_increment));
        }
        // Bounded by the segment so the sampling range stays finite.
        if !(0.0..=self.segment_length).contains(&self.jitter) {
            return Err(ConfigError::Jitter(self.jitter));
        }
        Ok(())
    }

    /// Parses a JSON document and validates the result.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_json::from_str(text).map_err(|e| ConfigError::Json {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[inline]
    pub fn attraction_distance_sq(&self) -> f32 {
        self.attraction_distance * self.attraction_distance
    }

    #[inline]
    pub fn kill_distance_sq(&self) -> f32 {
        self.kill_distance * self.kill_distance
    }
}
