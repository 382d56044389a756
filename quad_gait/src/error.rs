//! Gait engine error types.

use quad_common::config::ConfigError;
use quad_common::driver::DriverError;
use thiserror::Error;

/// Errors that stop the engine from starting or initializing.
///
/// Per-tick problems (clamped angles, failed writes) are not errors; they
/// are reported through `TickReport`.
#[derive(Debug, Error)]
pub enum GaitError {
    /// Configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Driver could not be created or the bus could not be opened.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Tick period or cycle duration rejected.
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    /// `start` called before `initialize`.
    #[error("Servo bus not initialized")]
    NotInitialized,
}
