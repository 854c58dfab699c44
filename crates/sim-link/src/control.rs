//! Vehicle command and alert collaborator traits

use crate::SimLinkError;
use serde::{Deserialize, Serialize};

/// Vehicle velocity vector (m/s, simulator world axes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl VelocityVector {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Scalar magnitude in m/s
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Alert cue kinds the core can request from the audio/visual collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    /// Short acknowledgment chime (system toggled off)
    Acknowledge,
    /// Single warning tone (first escalation stage)
    AlertTone,
    /// Double warning tone (urgent escalation stage)
    DoubleAlertTone,
    /// Continuous fault alarm
    FaultAlarm,
    /// Collision alarm
    CollisionAlarm,
}

/// Sink for braking and cruise-mode commands, implemented by the
/// simulator-facing vehicle handle.
pub trait VehicleCommandSink: Send + Sync {
    /// Apply a braking intensity in `0.0..=1.0`; `0.0` releases the brake.
    fn apply_brake(&self, intensity: f32) -> Result<(), SimLinkError>;

    /// Disengage the constant-speed cruise mode.
    fn disable_cruise_mode(&self) -> Result<(), SimLinkError>;
}

/// Sink for audible tones and the fault screen.
pub trait AlertSink: Send + Sync {
    fn play_alert(&self, kind: AlertKind) -> Result<(), SimLinkError>;

    fn show_fault_screen(&self) -> Result<(), SimLinkError>;
}

/// Blocking operator acknowledgment.
///
/// The fault path waits here until the operator dismisses the alarm.
/// Tests inject a non-blocking implementation.
pub trait AcknowledgmentGate: Send + Sync {
    fn await_acknowledgment(&self);
}
