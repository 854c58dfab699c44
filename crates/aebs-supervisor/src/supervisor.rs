//! Supervisor state machine and evaluation loop

use crate::config::AebsConfig;
use crate::context::{SupervisorContext, SupervisorStage, SupervisorStatus};
use crate::SupervisorError;
use kinematics::KinematicsTracker;
use obstacle_estimator::ObstacleEstimator;
use sim_link::{AcknowledgmentGate, AlertKind, AlertSink, VehicleCommandSink};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Automatic emergency braking supervisor.
///
/// Owns the activation flag, the escalation stage, and the background
/// evaluation task. Collaborator sinks are injected at construction;
/// the kinematics tracker and obstacle estimator are shared read-only.
pub struct AebsSupervisor {
    config: AebsConfig,
    ctx: SupervisorContext,
    kinematics: Arc<KinematicsTracker>,
    estimator: Arc<ObstacleEstimator>,
    commands: Arc<dyn VehicleCommandSink>,
    alerts: Arc<dyn AlertSink>,
    ack_gate: Arc<dyn AcknowledgmentGate>,
    status_tx: watch::Sender<SupervisorStatus>,
    status_rx: watch::Receiver<SupervisorStatus>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AebsSupervisor {
    pub fn new(
        config: AebsConfig,
        kinematics: Arc<KinematicsTracker>,
        estimator: Arc<ObstacleEstimator>,
        commands: Arc<dyn VehicleCommandSink>,
        alerts: Arc<dyn AlertSink>,
        ack_gate: Arc<dyn AcknowledgmentGate>,
    ) -> Self {
        let active = config.start_active;
        let (status_tx, status_rx) = watch::channel(SupervisorStatus::initial(active));
        info!("AEBS supervisor created (active: {})", active);
        Self {
            ctx: SupervisorContext::new(active),
            config,
            kinematics,
            estimator,
            commands,
            alerts,
            ack_gate,
            status_tx,
            status_rx,
            task: Mutex::new(None),
        }
    }

    /// Spawn the background evaluation loop.
    pub fn start(supervisor: &Arc<Self>) -> Result<(), SupervisorError> {
        let mut slot = supervisor.task.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return Err(SupervisorError::AlreadyRunning);
        }
        let runner = Arc::clone(supervisor);
        *slot = Some(tokio::spawn(async move {
            runner.evaluation_loop().await;
        }));
        Ok(())
    }

    /// Request loop termination and wait for it to fully exit.
    ///
    /// Must complete before the vehicle handle is destroyed so no brake
    /// command is issued against a dead actor.
    pub async fn shutdown(&self) {
        info!("Shutting down AEBS supervisor");
        self.ctx.request_shutdown();
        let handle = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Evaluation loop join failed: {}", e);
            }
        }
    }

    /// Flip the operator toggle; returns the new `active` value.
    ///
    /// Turning off plays an audible acknowledgment. Turning on re-runs
    /// the self-check and logs the outcome without blocking.
    pub fn toggle(&self) -> bool {
        if self.ctx.is_active() {
            self.ctx.set_active(false);
            info!("AEBS toggled off");
            self.play_alert(AlertKind::Acknowledge);
            false
        } else {
            self.activate("operator toggle");
            true
        }
    }

    /// Refresh speed from the kinematics tracker, applying the
    /// auto-activation rule; returns the current speed in km/h.
    pub fn refresh_speed(&self) -> f32 {
        let speed = self.kinematics.speed_kmh();
        self.maybe_auto_activate(speed);
        speed
    }

    /// Refresh the obstacle distance from the estimator.
    pub fn refresh_distance(&self) -> Option<f32> {
        self.estimator.current_distance()
    }

    /// Run the self-test.
    ///
    /// On failure the supervisor deactivates itself, raises the fault
    /// alarm and screen, and blocks until the operator acknowledges.
    /// Failure is never fatal to the process; re-toggling recovers.
    pub fn self_test(&self) -> bool {
        info!("Running AEBS self-test");
        match self.run_self_check() {
            Ok(()) => {
                info!("AEBS self-test passed");
                true
            }
            Err(e) => {
                error!("AEBS self-test failed: {}", e);
                self.ctx.set_active(false);
                self.play_alert(AlertKind::FaultAlarm);
                if let Err(e) = self.alerts.show_fault_screen() {
                    warn!("Fault screen unavailable: {}", e);
                }
                self.ack_gate.await_acknowledgment();
                false
            }
        }
    }

    /// Driver-input collaborator: the operator is actively braking or
    /// steering, suppress automatic intervention.
    pub fn set_driver_override(&self, engaged: bool) {
        debug!("Driver override: {}", engaged);
        self.ctx.set_driver_override(engaged);
    }

    /// Constant-speed cruise mode engaged or released by the operator.
    pub fn set_cruise_engaged(&self, engaged: bool) {
        info!("Cruise mode engaged: {}", engaged);
        self.ctx.set_cruise_engaged(engaged);
    }

    /// Reverse gear state from the vehicle control collaborator.
    pub fn set_reverse_gear(&self, engaged: bool) {
        debug!("Reverse gear: {}", engaged);
        self.ctx.set_reverse_gear(engaged);
    }

    /// Collision confirmed by the simulator; latches the crash state.
    pub fn on_collision(&self) {
        error!("Collision reported by simulator");
        self.ctx.set_collision(true);
        self.play_alert(AlertKind::CollisionAlarm);
    }

    pub fn is_active(&self) -> bool {
        self.ctx.is_active()
    }

    pub fn stage(&self) -> SupervisorStage {
        self.ctx.stage()
    }

    /// Latest status snapshot published by the evaluation loop.
    pub fn status(&self) -> SupervisorStatus {
        *self.status_rx.borrow()
    }

    async fn evaluation_loop(self: Arc<Self>) {
        info!(
            "AEBS evaluation loop started (period: {} ms)",
            self.config.eval_period_ms
        );
        let mut ticker = tokio::time::interval(self.config.eval_period());
        loop {
            ticker.tick().await;
            if self.ctx.is_shutdown() {
                break;
            }
            self.evaluate_once();
        }
        // never leave the brake held against a vehicle we stop commanding
        if self.ctx.stage() != SupervisorStage::Idle {
            self.apply_brake(0.0);
            self.ctx.set_stage(SupervisorStage::Idle);
        }
        info!("AEBS evaluation loop stopped");
    }

    /// One evaluation pass: read the shared inputs, advance the stage
    /// machine, publish a status snapshot. The background loop invokes
    /// this once per period; callers embedding the supervisor in their
    /// own scheduler may drive it directly.
    pub fn evaluate_once(&self) {
        let speed = self.kinematics.speed_kmh();
        self.maybe_auto_activate(speed);
        let distance = self.estimator.current_distance();

        if !self.ctx.is_active() {
            self.abort_intervention("supervisor inactive");
        } else if self.ctx.driver_override() {
            self.abort_intervention("driver override");
        } else if self.ctx.stage() == SupervisorStage::Holding {
            if self.kinematics.is_standstill() {
                info!("Vehicle at standstill, releasing emergency brake");
                self.apply_brake(0.0);
                self.ctx.set_stage(SupervisorStage::Idle);
            }
        } else if self.ctx.cruise_engaged() {
            // an unknown distance means "no obstacle in range", never
            // "collision imminent"
            if let Some(d) = distance.filter(|d| *d > 0.0) {
                self.escalate(d);
            }
        }

        self.publish_status(speed, distance);
    }

    /// Advance the stage machine for a known obstacle distance.
    ///
    /// Thresholds are checked in fixed order within one pass, so a
    /// sudden close obstacle walks through every stage without skipping
    /// one; the stage never regresses here.
    fn escalate(&self, distance_m: f32) {
        let mut stage = self.ctx.stage();

        if stage == SupervisorStage::Idle && distance_m < self.config.alert_distance_m {
            info!("Obstacle at {:.2} m, alerting driver", distance_m);
            self.play_alert(AlertKind::AlertTone);
            stage = SupervisorStage::Alerting;
            self.ctx.set_stage(stage);
        }
        if stage == SupervisorStage::Alerting && distance_m < self.config.urgent_distance_m {
            warn!("Obstacle at {:.2} m, braking pending", distance_m);
            self.play_alert(AlertKind::DoubleAlertTone);
            stage = SupervisorStage::Braking;
            self.ctx.set_stage(stage);
        }
        if stage == SupervisorStage::Braking && distance_m < self.config.brake_distance_m {
            warn!("Obstacle at {:.2} m, issuing emergency brake", distance_m);
            if let Err(e) = self.commands.disable_cruise_mode() {
                warn!("Cruise disengage failed: {}", e);
            }
            self.ctx.set_cruise_engaged(false);
            self.apply_brake(self.config.full_brake_intensity);
            self.ctx.set_stage(SupervisorStage::Holding);
        }
    }

    /// Cancel any in-progress intervention and return to `Idle`.
    fn abort_intervention(&self, reason: &str) {
        if self.ctx.stage() != SupervisorStage::Idle {
            debug!("Canceling intervention ({})", reason);
            self.apply_brake(0.0);
            self.ctx.set_stage(SupervisorStage::Idle);
        }
    }

    fn maybe_auto_activate(&self, speed_kmh: f32) {
        if speed_kmh >= self.config.activation_speed_kmh && !self.ctx.is_active() {
            info!(
                "Speed {:.1} km/h above activation threshold, forcing AEBS on",
                speed_kmh
            );
            self.activate("auto-activation");
        }
    }

    fn activate(&self, reason: &str) {
        self.ctx.set_active(true);
        info!("AEBS activated ({})", reason);
        match self.run_self_check() {
            Ok(()) => info!("AEBS self-check passed"),
            Err(e) => warn!("AEBS self-check failed: {}", e),
        }
    }

    fn run_self_check(&self) -> Result<(), SupervisorError> {
        self.config.validate()?;
        // probe the command path with a harmless zero-intensity brake
        self.commands.apply_brake(0.0)?;
        Ok(())
    }

    fn publish_status(&self, speed_kmh: f32, distance_m: Option<f32>) {
        self.status_tx.send_replace(SupervisorStatus {
            active: self.ctx.is_active(),
            stage: self.ctx.stage(),
            speed_kmh,
            distance_m,
            collision: self.ctx.collision(),
            reverse_gear: self.ctx.reverse_gear(),
        });
    }

    fn apply_brake(&self, intensity: f32) {
        if let Err(e) = self.commands.apply_brake(intensity) {
            warn!("Brake command ({:.2}) failed: {}", intensity, e);
        }
    }

    fn play_alert(&self, kind: AlertKind) {
        if let Err(e) = self.alerts.play_alert(kind) {
            warn!("Alert cue {:?} failed: {}", kind, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obstacle_estimator::{ActorKind, EstimatorConfig, RangingObservation};
    use sim_link::{SimLinkError, VelocityVector};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Instant;

    #[derive(Default)]
    struct RecordingSink {
        brakes: Mutex<Vec<f32>>,
        alerts: Mutex<Vec<AlertKind>>,
        cruise_disabled: AtomicBool,
        fault_screen_shown: AtomicBool,
        fail_commands: AtomicBool,
    }

    impl RecordingSink {
        fn brake_log(&self) -> Vec<f32> {
            self.brakes.lock().unwrap().clone()
        }

        fn alert_log(&self) -> Vec<AlertKind> {
            self.alerts.lock().unwrap().clone()
        }
    }

    impl VehicleCommandSink for RecordingSink {
        fn apply_brake(&self, intensity: f32) -> Result<(), SimLinkError> {
            if self.fail_commands.load(Ordering::SeqCst) {
                return Err(SimLinkError::LinkLost);
            }
            self.brakes.lock().unwrap().push(intensity);
            Ok(())
        }

        fn disable_cruise_mode(&self) -> Result<(), SimLinkError> {
            self.cruise_disabled.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    impl AlertSink for RecordingSink {
        fn play_alert(&self, kind: AlertKind) -> Result<(), SimLinkError> {
            self.alerts.lock().unwrap().push(kind);
            Ok(())
        }

        fn show_fault_screen(&self) -> Result<(), SimLinkError> {
            self.fault_screen_shown.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingGate {
        acknowledged: AtomicUsize,
    }

    impl AcknowledgmentGate for CountingGate {
        fn await_acknowledgment(&self) {
            self.acknowledged.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        supervisor: Arc<AebsSupervisor>,
        sink: Arc<RecordingSink>,
        gate: Arc<CountingGate>,
        tracker: Arc<KinematicsTracker>,
        estimator: Arc<ObstacleEstimator>,
    }

    fn harness(config: AebsConfig) -> Harness {
        let sink = Arc::new(RecordingSink::default());
        let gate = Arc::new(CountingGate::default());
        let tracker = Arc::new(KinematicsTracker::new());
        let estimator = Arc::new(ObstacleEstimator::new(EstimatorConfig::default()));
        let supervisor = Arc::new(AebsSupervisor::new(
            config,
            Arc::clone(&tracker),
            Arc::clone(&estimator),
            sink.clone(),
            sink.clone(),
            gate.clone(),
        ));
        Harness {
            supervisor,
            sink,
            gate,
            tracker,
            estimator,
        }
    }

    fn drive_at(h: &Harness, speed_kmh: f32) {
        h.tracker
            .update(VelocityVector::new(speed_kmh / 3.6, 0.0, 0.0));
    }

    fn obstacle_at(h: &Harness, distance_m: f32) {
        h.estimator.observe_ranging(RangingObservation {
            distance_m,
            actor_id: 1,
            actor_kind: ActorKind::Vehicle,
            observed_at: Instant::now(),
        });
    }

    #[test]
    fn test_monotonic_escalation() {
        let h = harness(AebsConfig::default());
        drive_at(&h, 20.0);
        h.supervisor.set_cruise_engaged(true);

        let mut stages = Vec::new();
        for distance in [5.0, 3.5, 2.5, 1.5] {
            obstacle_at(&h, distance);
            h.supervisor.evaluate_once();
            stages.push(h.supervisor.stage());
        }
        assert_eq!(
            stages,
            vec![
                SupervisorStage::Idle,
                SupervisorStage::Alerting,
                SupervisorStage::Braking,
                SupervisorStage::Holding,
            ]
        );
        assert!(h.sink.cruise_disabled.load(Ordering::SeqCst));
        assert_eq!(h.sink.brake_log(), vec![1.0]);
        assert_eq!(
            h.sink.alert_log(),
            vec![AlertKind::AlertTone, AlertKind::DoubleAlertTone]
        );
    }

    #[test]
    fn test_holding_releases_at_standstill() {
        let h = harness(AebsConfig::default());
        drive_at(&h, 20.0);
        h.supervisor.set_cruise_engaged(true);
        obstacle_at(&h, 1.5);
        h.supervisor.evaluate_once();
        assert_eq!(h.supervisor.stage(), SupervisorStage::Holding);

        // still rolling: brake stays on
        drive_at(&h, 5.0);
        h.supervisor.evaluate_once();
        assert_eq!(h.supervisor.stage(), SupervisorStage::Holding);

        drive_at(&h, 0.0);
        h.supervisor.evaluate_once();
        assert_eq!(h.supervisor.stage(), SupervisorStage::Idle);
        assert_eq!(h.sink.brake_log(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_single_pass_cascade_skips_no_stage() {
        let h = harness(AebsConfig::default());
        drive_at(&h, 20.0);
        h.supervisor.set_cruise_engaged(true);
        obstacle_at(&h, 1.5);
        h.supervisor.evaluate_once();

        // one pass walked Idle → Alerting → Braking → Holding
        assert_eq!(h.supervisor.stage(), SupervisorStage::Holding);
        assert_eq!(
            h.sink.alert_log(),
            vec![AlertKind::AlertTone, AlertKind::DoubleAlertTone]
        );
        assert_eq!(h.sink.brake_log(), vec![1.0]);
    }

    #[test]
    fn test_driver_override_resets_stage() {
        let h = harness(AebsConfig::default());
        drive_at(&h, 20.0);
        h.supervisor.set_cruise_engaged(true);
        obstacle_at(&h, 2.5);
        h.supervisor.evaluate_once();
        h.supervisor.evaluate_once();
        assert_eq!(h.supervisor.stage(), SupervisorStage::Braking);

        h.supervisor.set_driver_override(true);
        h.supervisor.evaluate_once();
        assert_eq!(h.supervisor.stage(), SupervisorStage::Idle);
        // cancellation releases the (pending) brake
        assert_eq!(h.sink.brake_log().last(), Some(&0.0));
    }

    #[test]
    fn test_unknown_distance_never_escalates() {
        let h = harness(AebsConfig::default());
        drive_at(&h, 20.0);
        h.supervisor.set_cruise_engaged(true);
        for _ in 0..10 {
            h.supervisor.evaluate_once();
        }
        assert_eq!(h.supervisor.stage(), SupervisorStage::Idle);
        assert!(h.sink.brake_log().is_empty());
    }

    #[test]
    fn test_no_escalation_without_cruise() {
        let h = harness(AebsConfig::default());
        drive_at(&h, 20.0);
        obstacle_at(&h, 1.5);
        h.supervisor.evaluate_once();
        assert_eq!(h.supervisor.stage(), SupervisorStage::Idle);
    }

    #[test]
    fn test_toggle_twice_is_idempotent() {
        let h = harness(AebsConfig::default());
        assert!(h.supervisor.is_active());
        assert!(!h.supervisor.toggle());
        assert!(h.supervisor.toggle());
        assert!(h.supervisor.is_active());
    }

    #[test]
    fn test_toggle_off_plays_acknowledgment() {
        let h = harness(AebsConfig::default());
        h.supervisor.toggle();
        assert_eq!(h.sink.alert_log(), vec![AlertKind::Acknowledge]);
    }

    #[test]
    fn test_auto_activation_above_threshold() {
        let h = harness(AebsConfig::default());
        h.supervisor.toggle();
        assert!(!h.supervisor.is_active());

        drive_at(&h, 10.0);
        h.supervisor.refresh_speed();
        assert!(!h.supervisor.is_active());

        drive_at(&h, 20.0);
        let speed = h.supervisor.refresh_speed();
        assert!((speed - 20.0).abs() < 1e-3);
        assert!(h.supervisor.is_active());
    }

    #[test]
    fn test_deactivation_cancels_intervention() {
        let h = harness(AebsConfig::default());
        drive_at(&h, 20.0);
        h.supervisor.set_cruise_engaged(true);
        obstacle_at(&h, 1.5);
        h.supervisor.evaluate_once();
        assert_eq!(h.supervisor.stage(), SupervisorStage::Holding);

        h.supervisor.toggle();
        h.supervisor.evaluate_once();
        assert_eq!(h.supervisor.stage(), SupervisorStage::Idle);
        assert_eq!(h.sink.brake_log(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_self_test_failure_deactivates_and_blocks() {
        let h = harness(AebsConfig {
            alert_distance_m: 1.0, // below brake distance: invalid ordering
            ..Default::default()
        });
        assert!(!h.supervisor.self_test());
        assert!(!h.supervisor.is_active());
        assert!(h.sink.fault_screen_shown.load(Ordering::SeqCst));
        assert_eq!(h.sink.alert_log(), vec![AlertKind::FaultAlarm]);
        assert_eq!(h.gate.acknowledged.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_self_test_detects_dead_command_sink() {
        let h = harness(AebsConfig::default());
        h.sink.fail_commands.store(true, Ordering::SeqCst);
        assert!(!h.supervisor.self_test());
        assert!(!h.supervisor.is_active());
        assert_eq!(h.gate.acknowledged.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_status_snapshot_tracks_evaluation() {
        let h = harness(AebsConfig::default());
        drive_at(&h, 20.0);
        h.supervisor.set_cruise_engaged(true);
        obstacle_at(&h, 3.5);
        h.supervisor.evaluate_once();

        let status = h.supervisor.status();
        assert!(status.active);
        assert_eq!(status.stage, SupervisorStage::Alerting);
        assert!((status.speed_kmh - 20.0).abs() < 1e-3);
        assert_eq!(status.distance_m, Some(3.5));
    }

    #[test]
    fn test_collision_latches() {
        let h = harness(AebsConfig::default());
        h.supervisor.on_collision();
        h.supervisor.evaluate_once();
        assert!(h.supervisor.status().collision);
        assert_eq!(h.sink.alert_log(), vec![AlertKind::CollisionAlarm]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_runs_and_shutdown_joins() {
        let h = harness(AebsConfig::default());
        drive_at(&h, 20.0);
        h.supervisor.set_cruise_engaged(true);
        obstacle_at(&h, 3.5);

        AebsSupervisor::start(&h.supervisor).unwrap();
        assert!(matches!(
            AebsSupervisor::start(&h.supervisor),
            Err(SupervisorError::AlreadyRunning)
        ));

        tokio::time::sleep(h.supervisor.config.eval_period() * 3).await;
        assert_eq!(h.supervisor.stage(), SupervisorStage::Alerting);

        h.supervisor.shutdown().await;
        // a second shutdown with no running loop is a no-op
        h.supervisor.shutdown().await;
    }
}
