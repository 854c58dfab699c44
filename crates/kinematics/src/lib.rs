//! Kinematics Tracker
//!
//! Maintains the current scalar speed from the simulator's per-frame
//! velocity vector. No history is retained; the latest value is stored
//! as a whole atomic word so the evaluation loop and the render loop
//! never observe a torn update.

use sim_link::VelocityVector;
use std::sync::atomic::{AtomicU32, Ordering};

/// m/s → km/h
const MPS_TO_KMH: f32 = 3.6;

/// Current-speed tracker shared between the render tick and the
/// background evaluation loop.
#[derive(Debug, Default)]
pub struct KinematicsTracker {
    /// Speed in km/h, stored as raw f32 bits
    speed_bits: AtomicU32,
}

impl KinematicsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute speed from a velocity vector; returns the new km/h value.
    pub fn update(&self, velocity: VelocityVector) -> f32 {
        let speed_kmh = velocity.magnitude() * MPS_TO_KMH;
        self.speed_bits.store(speed_kmh.to_bits(), Ordering::Release);
        speed_kmh
    }

    /// Latest speed in km/h
    pub fn speed_kmh(&self) -> f32 {
        f32::from_bits(self.speed_bits.load(Ordering::Acquire))
    }

    /// True when the vehicle is at (or numerically indistinguishable
    /// from) a standstill.
    pub fn is_standstill(&self) -> bool {
        self.speed_kmh() <= f32::EPSILON
    }
}
