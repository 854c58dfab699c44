//! AEBS Demo Client - Main Entry Point
//!
//! Scripted scenario: the ego vehicle cruises in constant-velocity mode
//! toward a slower lead vehicle until the supervisor escalates through
//! alert, urgent alert, and full braking, then releases the brake at
//! standstill.

use aebs_supervisor::{AebsSupervisor, SupervisorStage};
use anyhow::Result;
use demo_client::stub::{ConsoleLamp, SimulatorStub};
use demo_client::{init_logging, AppConfig};
use kinematics::KinematicsTracker;
use obstacle_estimator::{ActorKind, ObstacleEstimator, RangingObservation, VisionConfig};
use sim_link::{SemanticFrame, VelocityVector};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use warning_indicator::WarningIndicator;

/// Frame cadence of the scripted render loop
const FRAME_PERIOD: Duration = Duration::from_millis(20);

/// Closing speed toward the lead vehicle (m/s)
const CLOSING_SPEED_MPS: f32 = 2.5;

/// Deceleration under full braking (m/s^2)
const FULL_BRAKE_DECEL_MPS2: f32 = 7.0;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("=== AEBS Demo Client v{} ===", env!("CARGO_PKG_VERSION"));
    let config = AppConfig::load()?;

    let tracker = Arc::new(KinematicsTracker::new());
    let estimator = Arc::new(ObstacleEstimator::new(config.estimator));
    let sim = Arc::new(SimulatorStub::default());

    let supervisor = Arc::new(AebsSupervisor::new(
        config.supervisor,
        Arc::clone(&tracker),
        Arc::clone(&estimator),
        sim.clone(),
        sim.clone(),
        sim.clone(),
    ));
    let mut indicator = WarningIndicator::new(config.indicator);
    indicator.set_supervisor(Arc::clone(&supervisor));

    if !supervisor.self_test() {
        warn!("Self-test failed, running disengaged until re-toggled");
    }

    AebsSupervisor::start(&supervisor)?;
    supervisor.set_cruise_engaged(true);

    run_scenario(
        &supervisor,
        &tracker,
        &estimator,
        &sim,
        &mut indicator,
        config.estimator.vision,
    )
    .await;

    // operator turns the system off; the lamp check re-arms
    supervisor.toggle();
    indicator.reset();

    info!(
        "Final status: {}",
        serde_json::to_string_pretty(&supervisor.status())?
    );
    supervisor.shutdown().await;
    info!("Demo complete");
    Ok(())
}

async fn run_scenario(
    supervisor: &Arc<AebsSupervisor>,
    tracker: &Arc<KinematicsTracker>,
    estimator: &Arc<ObstacleEstimator>,
    sim: &Arc<SimulatorStub>,
    indicator: &mut WarningIndicator,
    vision: VisionConfig,
) {
    let dt = FRAME_PERIOD.as_secs_f32();
    let mut lamp = ConsoleLamp;
    let mut gap_m: f32 = 12.0;
    let mut speed_mps: f32 = 10.0; // 36 km/h, above the activation speed
    let mut intervened = false;

    for frame in 0u32..600 {
        tracker.update(VelocityVector::new(speed_mps, 0.0, 0.0));
        estimator.observe_ranging(RangingObservation {
            distance_m: gap_m,
            actor_id: 99,
            actor_kind: ActorKind::Vehicle,
            observed_at: Instant::now(),
        });
        // the semantic camera updates on a slower cadence
        if frame % 10 == 0 {
            estimator.observe_frame(&lead_vehicle_frame(gap_m, &vision));
        }

        let speed_kmh = supervisor.refresh_speed();
        let state = indicator.render(&mut lamp);
        if frame % 25 == 0 {
            info!(
                "frame {:3}: distance {:?} m, speed {:4.1} km/h, stage {:?}, lamp {:?}",
                frame,
                supervisor.refresh_distance(),
                speed_kmh,
                supervisor.stage(),
                state
            );
        }

        tokio::time::sleep(FRAME_PERIOD).await;

        if sim.last_brake() > 0.5 {
            // emergency brake active: bleed off speed, gap holds
            speed_mps = (speed_mps - FULL_BRAKE_DECEL_MPS2 * dt).max(0.0);
        } else {
            gap_m = (gap_m - CLOSING_SPEED_MPS * dt).max(0.3);
        }

        if supervisor.stage() == SupervisorStage::Holding {
            intervened = true;
        }
        if intervened && supervisor.stage() == SupervisorStage::Idle {
            info!("Intervention complete after {} frames", frame + 1);
            break;
        }
    }
}

/// Synthesize a semantic frame whose vehicle footprint matches the
/// current gap under the pinhole model.
fn lead_vehicle_frame(gap_m: f32, vision: &VisionConfig) -> SemanticFrame {
    let width: u32 = 200;
    let footprint = ((vision.object_width_m * vision.focal_length / gap_m.max(0.1)).round()
        as usize)
        .clamp(1, width as usize);
    let mut data = vec![0u8; (width * 3) as usize];
    for px in data.iter_mut().skip(width as usize).take(footprint) {
        *px = vision.vehicle_class_id;
    }
    SemanticFrame::new(data, width, 3, 0)
}
