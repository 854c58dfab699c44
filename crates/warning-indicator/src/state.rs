//! Lamp state classification

use aebs_supervisor::SupervisorStatus;
use braking_model::BrakingModel;
use serde::{Deserialize, Serialize};

/// Discrete warning lamp state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LampState {
    /// Lamp not yet driven by real data
    #[default]
    NotInitialized,
    /// Supervisor unavailable or internal error
    Fault,
    /// System armed, no obstacle in warning range
    Ready,
    /// System off (toggled off, or reverse gear engaged)
    Disengaged,
    /// Obstacle inside the early warning threshold
    WarnLow,
    /// Obstacle inside the late warning threshold
    WarnHigh,
    /// Collision confirmed
    Crash,
}

/// Derive the lamp state from a supervisor status snapshot.
///
/// Pure: the result depends only on the snapshot and the braking model.
/// The classification is advisory and independent of whether the
/// supervisor chose to intervene.
pub fn classify(
    status: &SupervisorStatus,
    model: &BrakingModel,
    activation_speed_kmh: f32,
) -> LampState {
    if status.collision {
        return LampState::Crash;
    }
    if !status.active || status.reverse_gear {
        return LampState::Disengaged;
    }
    if status.speed_kmh <= 0.0 || status.speed_kmh < activation_speed_kmh {
        return LampState::Ready;
    }

    let envelope = model.envelope(status.speed_kmh);
    match status.distance_m {
        // no obstacle in range, not "collision imminent"
        None => LampState::Ready,
        Some(d) if d <= 0.0 => LampState::Ready,
        Some(d) if d <= envelope.warn_high_threshold => LampState::WarnHigh,
        Some(d) if d <= envelope.warn_low_threshold => LampState::WarnLow,
        Some(_) => LampState::Ready,
    }
}
