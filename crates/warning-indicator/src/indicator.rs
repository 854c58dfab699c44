//! Lamp rendering and frame loop integration

use crate::self_test::{SelfTestSequence, DEFAULT_STEP_FRAMES};
use crate::state::{classify, LampState};
use aebs_supervisor::AebsSupervisor;
use braking_model::{BrakingModel, BrakingModelConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// RGB lamp color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LampColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LampColor {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const ORANGE: Self = Self::new(255, 165, 0);
    pub const GREEN: Self = Self::new(31, 94, 10);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const OFF: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Renderer-agnostic drawing contract.
///
/// Slot 0 is the bottom lamp; higher warning states stack further
/// lamps above it.
pub trait LampSurface {
    fn draw_lamp(&mut self, slot: u8, color: LampColor);
}

/// Indicator configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Speed below which the system shows `Ready` regardless of
    /// distance (km/h); matches the supervisor's activation speed
    pub activation_speed_kmh: f32,

    /// Frames per startup self-test step
    pub self_test_step_frames: u32,

    /// Braking model used for the warning thresholds
    pub braking: BrakingModelConfig,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            activation_speed_kmh: 15.0,
            self_test_step_frames: DEFAULT_STEP_FRAMES,
            braking: BrakingModelConfig::default(),
        }
    }
}

/// Dashboard warning lamp.
///
/// Polls the supervisor's status snapshot every display frame and
/// paints the classified state; holds the supervisor strictly
/// read-only.
pub struct WarningIndicator {
    config: IndicatorConfig,
    model: BrakingModel,
    supervisor: Option<Arc<AebsSupervisor>>,
    self_test: SelfTestSequence,
    last_state: LampState,
}

impl WarningIndicator {
    pub fn new(config: IndicatorConfig) -> Self {
        Self {
            model: BrakingModel::new(config.braking),
            self_test: SelfTestSequence::new(config.self_test_step_frames),
            config,
            supervisor: None,
            last_state: LampState::NotInitialized,
        }
    }

    /// Attach the supervisor to observe. Without one the lamp renders
    /// `Fault`.
    pub fn set_supervisor(&mut self, supervisor: Arc<AebsSupervisor>) {
        self.supervisor = Some(supervisor);
    }

    /// Restart the startup self-test; invoked whenever the supervisor
    /// is toggled.
    pub fn reset(&mut self) {
        debug!("Warning indicator reset, lamp check restarting");
        self.self_test.restart();
    }

    /// Render one display frame; returns the state that was painted.
    pub fn render(&mut self, surface: &mut dyn LampSurface) -> LampState {
        let state = match self.self_test.next_frame() {
            Some(forced) => forced,
            None => self.derive_state(),
        };
        if state != self.last_state {
            debug!("Warning lamp {:?} -> {:?}", self.last_state, state);
            self.last_state = state;
        }
        paint(surface, state);
        state
    }

    fn derive_state(&self) -> LampState {
        match &self.supervisor {
            None => {
                warn!("Warning indicator has no supervisor reference");
                LampState::Fault
            }
            Some(supervisor) => classify(
                &supervisor.status(),
                &self.model,
                self.config.activation_speed_kmh,
            ),
        }
    }
}

/// Number of stacked lamps a state lights up
pub fn stack_height(state: LampState) -> u8 {
    match state {
        LampState::WarnHigh => 2,
        LampState::Crash => 3,
        _ => 1,
    }
}

/// Lamp color for a state
pub fn color_for(state: LampState) -> LampColor {
    match state {
        LampState::NotInitialized => LampColor::WHITE,
        LampState::Fault => LampColor::ORANGE,
        LampState::Ready => LampColor::GREEN,
        LampState::Disengaged => LampColor::OFF,
        LampState::WarnLow | LampState::WarnHigh | LampState::Crash => LampColor::RED,
    }
}

fn paint(surface: &mut dyn LampSurface, state: LampState) {
    let color = color_for(state);
    for slot in 0..stack_height(state) {
        surface.draw_lamp(slot, color);
    }
}
