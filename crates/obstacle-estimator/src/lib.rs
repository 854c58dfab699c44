//! Obstacle Distance Estimator
//!
//! Converts the two perception feeds into a single "distance to the
//! obstacle ahead":
//! - Ranging observations from the simulator's obstacle detector
//!   (fast, preferred while fresh)
//! - Vision estimates from the semantic camera (slower fallback)
//!
//! A ranging observation older than the configured staleness window is
//! discarded in favor of the vision value; with neither source the
//! estimator reports `None`, which callers must treat as "no obstacle
//! in range", never as "collision imminent".
//!
//! Both records are published as whole values over watch channels, so a
//! concurrent reader never sees a half-written observation.

pub mod vision;

pub use vision::{VisionConfig, VisionRangeEstimator};

use serde::{Deserialize, Serialize};
use sim_link::SemanticFrame;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::debug;

/// Kind of actor a ranging event bounced off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorKind {
    Vehicle,
    Walker,
    Static,
    Other,
}

/// One ranging observation from the obstacle detector
#[derive(Debug, Clone, Copy)]
pub struct RangingObservation {
    /// Measured distance to the actor (meters)
    pub distance_m: f32,
    /// Simulator id of the detected actor
    pub actor_id: u64,
    /// Actor classification
    pub actor_kind: ActorKind,
    /// When the observation was received
    pub observed_at: Instant,
}

/// Estimator configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Maximum age of a ranging observation before falling back to the
    /// vision estimate (milliseconds)
    pub max_ranging_age_ms: u64,

    /// Vision estimator settings
    pub vision: VisionConfig,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_ranging_age_ms: 1000,
            vision: VisionConfig::default(),
        }
    }
}

impl EstimatorConfig {
    pub fn max_ranging_age(&self) -> Duration {
        Duration::from_millis(self.max_ranging_age_ms)
    }
}

/// Two-source forward distance estimator
pub struct ObstacleEstimator {
    config: EstimatorConfig,
    vision_model: VisionRangeEstimator,
    ranging_tx: watch::Sender<Option<RangingObservation>>,
    ranging_rx: watch::Receiver<Option<RangingObservation>>,
    vision_tx: watch::Sender<Option<f32>>,
    vision_rx: watch::Receiver<Option<f32>>,
}

impl ObstacleEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        let (ranging_tx, ranging_rx) = watch::channel(None);
        let (vision_tx, vision_rx) = watch::channel(None);
        Self {
            vision_model: VisionRangeEstimator::new(config.vision),
            config,
            ranging_tx,
            ranging_rx,
            vision_tx,
            vision_rx,
        }
    }

    /// Ranging-collaborator callback. Non-vehicle actors are dropped,
    /// as are non-positive distances.
    pub fn observe_ranging(&self, observation: RangingObservation) {
        if observation.actor_kind != ActorKind::Vehicle {
            debug!(
                "Ignoring ranging event from non-vehicle actor {}",
                observation.actor_id
            );
            return;
        }
        if observation.distance_m <= 0.0 {
            debug!(
                "Ignoring non-positive ranging distance {:.2}",
                observation.distance_m
            );
            return;
        }
        self.ranging_tx.send_replace(Some(observation));
    }

    /// Vision-collaborator callback: recompute the fallback distance
    /// from a fresh semantic frame.
    pub fn observe_frame(&self, frame: &SemanticFrame) -> Option<f32> {
        let estimate = self.vision_model.estimate(frame);
        self.vision_tx.send_replace(estimate);
        estimate
    }

    /// Current distance to the obstacle ahead, `None` when no fresh
    /// source reports one.
    pub fn current_distance(&self) -> Option<f32> {
        self.current_distance_at(Instant::now())
    }

    /// Clock-injected variant of [`current_distance`].
    ///
    /// [`current_distance`]: ObstacleEstimator::current_distance
    pub fn current_distance_at(&self, now: Instant) -> Option<f32> {
        {
            let ranging = self.ranging_rx.borrow();
            if let Some(observation) = ranging.as_ref() {
                let age = now.duration_since(observation.observed_at);
                if age < self.config.max_ranging_age() {
                    return Some(observation.distance_m);
                }
                debug!("Ranging observation stale ({} ms old)", age.as_millis());
            }
        }
        *self.vision_rx.borrow()
    }
}

impl Default for ObstacleEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_link::frame::VEHICLE_CLASS_ID;

    fn vehicle_observation(distance_m: f32, observed_at: Instant) -> RangingObservation {
        RangingObservation {
            distance_m,
            actor_id: 42,
            actor_kind: ActorKind::Vehicle,
            observed_at,
        }
    }

    #[test]
    fn test_no_sources_reports_none() {
        let estimator = ObstacleEstimator::default();
        assert_eq!(estimator.current_distance(), None);
    }

    #[test]
    fn test_fresh_ranging_wins() {
        let estimator = ObstacleEstimator::default();
        let now = Instant::now();
        estimator.observe_ranging(vehicle_observation(12.5, now));

        let frame = SemanticFrame::new(vec![VEHICLE_CLASS_ID; 100], 10, 10, 0);
        estimator.observe_frame(&frame);

        assert_eq!(estimator.current_distance_at(now), Some(12.5));
    }

    #[test]
    fn test_stale_ranging_falls_back_to_vision() {
        let estimator = ObstacleEstimator::default();
        let observed = Instant::now();
        estimator.observe_ranging(vehicle_observation(12.5, observed));

        let frame = SemanticFrame::new(vec![VEHICLE_CLASS_ID; 100], 10, 10, 0);
        let vision = estimator.observe_frame(&frame).unwrap();

        let later = observed + Duration::from_millis(1500);
        assert_eq!(estimator.current_distance_at(later), Some(vision));
    }

    #[test]
    fn test_stale_ranging_without_vision_is_none() {
        let estimator = ObstacleEstimator::default();
        let observed = Instant::now();
        estimator.observe_ranging(vehicle_observation(8.0, observed));

        let later = observed + Duration::from_secs(5);
        assert_eq!(estimator.current_distance_at(later), None);
    }

    #[test]
    fn test_non_vehicle_actors_filtered() {
        let estimator = ObstacleEstimator::default();
        let now = Instant::now();
        estimator.observe_ranging(RangingObservation {
            distance_m: 3.0,
            actor_id: 7,
            actor_kind: ActorKind::Static,
            observed_at: now,
        });
        assert_eq!(estimator.current_distance_at(now), None);
    }

    #[test]
    fn test_newer_observation_replaces_older() {
        let estimator = ObstacleEstimator::default();
        let now = Instant::now();
        estimator.observe_ranging(vehicle_observation(20.0, now));
        estimator.observe_ranging(vehicle_observation(15.0, now));
        assert_eq!(estimator.current_distance_at(now), Some(15.0));
    }
}
