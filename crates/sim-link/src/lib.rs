//! Simulator Link
//!
//! The in-process contract between the AEBS core and its external
//! collaborators:
//! - Inbound perception types (velocity vectors, class-labeled frames)
//! - Outbound vehicle command sink (braking, cruise mode)
//! - Outbound audio/visual alert sink
//! - Operator acknowledgment gate for blocking fault screens
//!
//! The simulator engine itself (world state, physics, sensor pipelines)
//! lives behind these seams and is never implemented here.

pub mod control;
pub mod frame;

pub use control::{AcknowledgmentGate, AlertKind, AlertSink, VehicleCommandSink, VelocityVector};
pub use frame::SemanticFrame;

use thiserror::Error;

/// Simulator link error types
#[derive(Error, Debug)]
pub enum SimLinkError {
    #[error("vehicle command rejected: {0}")]
    CommandRejected(String),

    #[error("alert device unavailable: {0}")]
    AlertDevice(String),

    #[error("simulator link lost")]
    LinkLost,
}
