//! Warning Indicator
//!
//! The dashboard lamp for the emergency braking feature:
//! - A pure classifier deriving one of seven discrete lamp states from
//!   the supervisor's status snapshot each display frame
//! - A one-shot startup self-test cycling every renderable state so the
//!   operator can verify the lamp hardware
//! - A renderer-agnostic surface contract (stacked colored lamps)
//!
//! The indicator is strictly an observer: it never mutates supervisor
//! state.

pub mod indicator;
pub mod self_test;
pub mod state;

pub use indicator::{IndicatorConfig, LampColor, LampSurface, WarningIndicator};
pub use self_test::SelfTestSequence;
pub use state::{classify, LampState};
