//! Supervisor configuration

use crate::SupervisorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// AEBS configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AebsConfig {
    /// Speed above which the supervisor forces itself on (km/h)
    pub activation_speed_kmh: f32,

    /// Distance below which the first alert tone plays (meters)
    pub alert_distance_m: f32,

    /// Distance below which the double alert tone plays and braking
    /// becomes pending (meters)
    pub urgent_distance_m: f32,

    /// Distance below which cruise is disengaged and the full brake is
    /// issued (meters)
    pub brake_distance_m: f32,

    /// Brake intensity for the emergency intervention (0.0..=1.0)
    pub full_brake_intensity: f32,

    /// Evaluation loop period (milliseconds)
    pub eval_period_ms: u64,

    /// Whether the supervisor starts active
    pub start_active: bool,
}

impl Default for AebsConfig {
    fn default() -> Self {
        Self {
            activation_speed_kmh: 15.0,
            alert_distance_m: 4.0,
            urgent_distance_m: 3.0,
            brake_distance_m: 2.0,
            full_brake_intensity: 1.0,
            eval_period_ms: 50,
            start_active: true,
        }
    }
}

impl AebsConfig {
    pub fn eval_period(&self) -> Duration {
        Duration::from_millis(self.eval_period_ms)
    }

    /// Integrity check run at activation and by the self-test.
    ///
    /// The escalation thresholds must be strictly ordered so the stage
    /// machine cannot skip a warning step.
    pub fn validate(&self) -> Result<(), SupervisorError> {
        if self.activation_speed_kmh <= 0.0 {
            return Err(SupervisorError::InvalidConfig(
                "activation speed must be positive".into(),
            ));
        }
        if !(self.brake_distance_m > 0.0
            && self.urgent_distance_m > self.brake_distance_m
            && self.alert_distance_m > self.urgent_distance_m)
        {
            return Err(SupervisorError::InvalidConfig(format!(
                "escalation distances must satisfy alert > urgent > brake > 0, got {}/{}/{}",
                self.alert_distance_m, self.urgent_distance_m, self.brake_distance_m
            )));
        }
        if !(self.full_brake_intensity > 0.0 && self.full_brake_intensity <= 1.0) {
            return Err(SupervisorError::InvalidConfig(
                "brake intensity must be within (0.0, 1.0]".into(),
            ));
        }
        if self.eval_period_ms == 0 {
            return Err(SupervisorError::InvalidConfig(
                "evaluation period must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AebsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_unordered_distances_rejected() {
        let config = AebsConfig {
            alert_distance_m: 2.0,
            urgent_distance_m: 3.0,
            brake_distance_m: 4.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_intensity_rejected() {
        let config = AebsConfig {
            full_brake_intensity: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
