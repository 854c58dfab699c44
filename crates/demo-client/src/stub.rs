//! Logging stand-ins for the simulator collaborators

use sim_link::{AcknowledgmentGate, AlertKind, AlertSink, SimLinkError, VehicleCommandSink};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info, warn};
use warning_indicator::{LampColor, LampSurface};

/// Stand-in for the simulator vehicle handle and alert devices; every
/// command is logged and the last brake intensity is retained so the
/// scenario script can react to the intervention.
#[derive(Debug, Default)]
pub struct SimulatorStub {
    brake_bits: AtomicU32,
}

impl SimulatorStub {
    /// Last commanded brake intensity
    pub fn last_brake(&self) -> f32 {
        f32::from_bits(self.brake_bits.load(Ordering::Acquire))
    }
}

impl VehicleCommandSink for SimulatorStub {
    fn apply_brake(&self, intensity: f32) -> Result<(), SimLinkError> {
        self.brake_bits.store(intensity.to_bits(), Ordering::Release);
        info!("[sim] brake {:.2}", intensity);
        Ok(())
    }

    fn disable_cruise_mode(&self) -> Result<(), SimLinkError> {
        info!("[sim] constant-velocity mode disabled");
        Ok(())
    }
}

impl AlertSink for SimulatorStub {
    fn play_alert(&self, kind: AlertKind) -> Result<(), SimLinkError> {
        info!("[sim] alert cue {:?}", kind);
        Ok(())
    }

    fn show_fault_screen(&self) -> Result<(), SimLinkError> {
        warn!("[sim] fault screen raised");
        Ok(())
    }
}

impl AcknowledgmentGate for SimulatorStub {
    fn await_acknowledgment(&self) {
        info!("[sim] operator acknowledged the fault");
    }
}

/// Lamp surface that logs draw calls instead of painting
#[derive(Debug, Default)]
pub struct ConsoleLamp;

impl LampSurface for ConsoleLamp {
    fn draw_lamp(&mut self, slot: u8, color: LampColor) {
        debug!(
            "[lamp] slot {} -> #{:02x}{:02x}{:02x}",
            slot, color.r, color.g, color.b
        );
    }
}
