//! Braking Distance Model
//!
//! Maps the current speed to reaction, braking, and stopping distances
//! plus the two warning thresholds derived from them. Uses the
//! driving-school rule-of-thumb formulas with a configurable reduction
//! factor for low-speed test tracks.

use serde::{Deserialize, Serialize};

/// Warning threshold multiplier for the early (low-urgency) warning
const WARN_LOW_FACTOR: f32 = 1.5;

/// Warning threshold multiplier for the late (high-urgency) warning
const WARN_HIGH_FACTOR: f32 = 1.2;

/// Braking model configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BrakingModelConfig {
    /// Reduction factor applied to both distance legs. Full-scale road
    /// distances are hard to reproduce on a short test track, so the
    /// default halves them.
    pub track_scale: f32,
}

impl Default for BrakingModelConfig {
    fn default() -> Self {
        Self { track_scale: 0.5 }
    }
}

/// Distance envelope derived from a single speed sample (all meters)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BrakingEnvelope {
    /// Distance covered during driver reaction time
    pub reaction_distance: f32,
    /// Distance covered while braking to a stop
    pub braking_distance: f32,
    /// reaction + braking
    pub stop_distance: f32,
    /// Early warning threshold (stop distance + 50%)
    pub warn_low_threshold: f32,
    /// Late warning threshold (stop distance + 20%)
    pub warn_high_threshold: f32,
}

/// Pure speed→envelope model
#[derive(Debug, Clone, Copy, Default)]
pub struct BrakingModel {
    config: BrakingModelConfig,
}

impl BrakingModel {
    pub fn new(config: BrakingModelConfig) -> Self {
        Self { config }
    }

    /// Compute the distance envelope for a speed in km/h.
    ///
    /// Deterministic and side-effect free; negative speeds are clamped
    /// to standstill.
    pub fn envelope(&self, speed_kmh: f32) -> BrakingEnvelope {
        let v = speed_kmh.max(0.0) / 10.0;
        let braking_distance = v * v * self.config.track_scale;
        let reaction_distance = v * 3.0 * self.config.track_scale;
        let stop_distance = braking_distance + reaction_distance;
        BrakingEnvelope {
            reaction_distance,
            braking_distance,
            stop_distance,
            warn_low_threshold: stop_distance * WARN_LOW_FACTOR,
            warn_high_threshold: stop_distance * WARN_HIGH_FACTOR,
        }
    }
}
