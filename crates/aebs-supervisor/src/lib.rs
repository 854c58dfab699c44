//! AEBS Supervisor
//!
//! The decision core of the emergency braking feature:
//! - Escalation state machine (Idle → Alerting → Braking → Holding)
//! - Continuous background evaluation loop issuing brake commands
//! - Operator toggle, auto-activation above a speed threshold
//! - Self-test with a blocking fault acknowledgment path
//!
//! The supervisor exclusively owns its activation flag, stage, and the
//! evaluation task; observers read immutable status snapshots.

pub mod config;
pub mod context;
pub mod supervisor;

pub use config::AebsConfig;
pub use context::{SupervisorContext, SupervisorStage, SupervisorStatus};
pub use supervisor::AebsSupervisor;

use sim_link::SimLinkError;
use thiserror::Error;

/// Supervisor error types
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("vehicle command sink failed: {0}")]
    Command(#[from] SimLinkError),

    #[error("evaluation loop already running")]
    AlreadyRunning,
}
