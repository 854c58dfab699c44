//! Layered application configuration

use aebs_supervisor::AebsConfig;
use obstacle_estimator::EstimatorConfig;
use serde::{Deserialize, Serialize};
use warning_indicator::IndicatorConfig;

/// Top-level client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub supervisor: AebsConfig,
    pub estimator: EstimatorConfig,
    pub indicator: IndicatorConfig,
}

impl AppConfig {
    /// Load configuration: defaults, overridden by an optional
    /// `aebs.toml` next to the binary, overridden by `AEBS_*`
    /// environment variables (`AEBS_SUPERVISOR__ALERT_DISTANCE_M=5`).
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("aebs").required(false))
            .add_source(config::Environment::with_prefix("AEBS").separator("__"))
            .build()?
            .try_deserialize()
    }
}
