//! Vision-based distance estimation from class-labeled frames

use serde::{Deserialize, Serialize};
use sim_link::{frame::VEHICLE_CLASS_ID, SemanticFrame};

/// Vision estimator configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Camera focal length for the pinhole projection
    pub focal_length: f32,

    /// Assumed real-world width of the obstacle ahead (meters); a
    /// typical car width unless the lead vehicle's bounding box is
    /// known.
    pub object_width_m: f32,

    /// Class id the semantic camera assigns to vehicles
    pub vehicle_class_id: u8,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            focal_length: 36.661_84,
            object_width_m: 3.7,
            vehicle_class_id: VEHICLE_CLASS_ID,
        }
    }
}

/// Pinhole-projection range estimator over a semantic frame.
///
/// The apparent obstacle footprint is the maximum per-row count of
/// vehicle-class pixels; distance follows from
/// `object_width * focal_length / footprint`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisionRangeEstimator {
    config: VisionConfig,
}

impl VisionRangeEstimator {
    pub fn new(config: VisionConfig) -> Self {
        Self { config }
    }

    /// Estimate distance to the obstacle ahead, `None` when no
    /// vehicle-class pixel is visible.
    pub fn estimate(&self, frame: &SemanticFrame) -> Option<f32> {
        let footprint = frame
            .rows()
            .map(|row| {
                row.iter()
                    .filter(|&&c| c == self.config.vehicle_class_id)
                    .count()
            })
            .max()
            .unwrap_or(0);

        if footprint == 0 {
            return None;
        }
        Some(self.config.object_width_m * self.config.focal_length / footprint as f32)
    }
}
