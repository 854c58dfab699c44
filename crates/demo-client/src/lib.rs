//! AEBS Demo Client
//!
//! Wires the braking core against a scripted stand-in for the simulator
//! so the escalation chain and the warning lamp can be exercised
//! without a running engine.

pub mod app_config;
pub mod stub;

pub use app_config::AppConfig;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize the global tracing subscriber
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber was already installed");
    }
}
