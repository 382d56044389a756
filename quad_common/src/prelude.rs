//! Prelude module for common re-exports.
//!
//! ```rust
//! use quad_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    BusConfig, ConfigError, ConfigLoader, LogLevel, RobotConfig, ServoMode, SharedConfig,
    TimingConfig,
};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{AXIS_COUNT, LEG_COUNT, SERVO_COUNT};

// ─── Tables ─────────────────────────────────────────────────────────
pub use crate::gait::{GaitParams, GaitTable, LegParams, Waveform};
pub use crate::servo::{AngleRange, ServoConfig, ServoTable};

// ─── Types ──────────────────────────────────────────────────────────
pub use crate::types::{Axis, GaitFamily, GaitMode, Leg, RawUnit, ServoId};

// ─── Driver ─────────────────────────────────────────────────────────
pub use crate::driver::{DriverDiagnostics, DriverError, DriverFactory, ServoDriver};
