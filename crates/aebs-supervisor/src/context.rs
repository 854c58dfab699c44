//! Shared supervisor state
//!
//! The evaluation loop and the render/input loop both read these
//! fields; every one is a single atomic word, so neither side can
//! observe a torn update. The context is created with the supervisor
//! and torn down with it.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Escalation stage of the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SupervisorStage {
    /// No intervention in progress
    #[default]
    Idle,
    /// First alert tone played
    Alerting,
    /// Urgent tone played, full brake pending
    Braking,
    /// Full brake applied, waiting for standstill
    Holding,
}

impl SupervisorStage {
    fn as_u8(self) -> u8 {
        match self {
            SupervisorStage::Idle => 0,
            SupervisorStage::Alerting => 1,
            SupervisorStage::Braking => 2,
            SupervisorStage::Holding => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SupervisorStage::Alerting,
            2 => SupervisorStage::Braking,
            3 => SupervisorStage::Holding,
            _ => SupervisorStage::Idle,
        }
    }
}

/// Immutable status snapshot published by the evaluation loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupervisorStatus {
    pub active: bool,
    pub stage: SupervisorStage,
    pub speed_kmh: f32,
    pub distance_m: Option<f32>,
    pub collision: bool,
    pub reverse_gear: bool,
}

impl SupervisorStatus {
    pub(crate) fn initial(active: bool) -> Self {
        Self {
            active,
            stage: SupervisorStage::Idle,
            speed_kmh: 0.0,
            distance_m: None,
            collision: false,
            reverse_gear: false,
        }
    }
}

/// Atomically updated fields shared across the two loops
#[derive(Debug)]
pub struct SupervisorContext {
    active: AtomicBool,
    stage: AtomicU8,
    driver_override: AtomicBool,
    cruise_engaged: AtomicBool,
    reverse_gear: AtomicBool,
    collision: AtomicBool,
    shutdown: AtomicBool,
}

impl SupervisorContext {
    pub fn new(active: bool) -> Self {
        Self {
            active: AtomicBool::new(active),
            stage: AtomicU8::new(SupervisorStage::Idle.as_u8()),
            driver_override: AtomicBool::new(false),
            cruise_engaged: AtomicBool::new(false),
            reverse_gear: AtomicBool::new(false),
            collision: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub fn stage(&self) -> SupervisorStage {
        SupervisorStage::from_u8(self.stage.load(Ordering::Acquire))
    }

    pub fn set_stage(&self, stage: SupervisorStage) {
        self.stage.store(stage.as_u8(), Ordering::Release);
    }

    pub fn driver_override(&self) -> bool {
        self.driver_override.load(Ordering::Acquire)
    }

    pub fn set_driver_override(&self, engaged: bool) {
        self.driver_override.store(engaged, Ordering::Release);
    }

    pub fn cruise_engaged(&self) -> bool {
        self.cruise_engaged.load(Ordering::Acquire)
    }

    pub fn set_cruise_engaged(&self, engaged: bool) {
        self.cruise_engaged.store(engaged, Ordering::Release);
    }

    pub fn reverse_gear(&self) -> bool {
        self.reverse_gear.load(Ordering::Acquire)
    }

    pub fn set_reverse_gear(&self, engaged: bool) {
        self.reverse_gear.store(engaged, Ordering::Release);
    }

    pub fn collision(&self) -> bool {
        self.collision.load(Ordering::Acquire)
    }

    pub fn set_collision(&self, confirmed: bool) {
        self.collision.store(confirmed, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}
