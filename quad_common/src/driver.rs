//! Servo bus driver trait and error types.
//!
//! This module defines:
//! - `ServoDriver` trait - Interface for pluggable servo bus drivers
//! - `DriverError` enum - Error types for driver operations
//! - `DriverFactory` type alias - Factory function type
//! - `DriverDiagnostics` struct - Optional driver diagnostics

use crate::config::{BusConfig, ServoMode};
use crate::types::{RawUnit, ServoId};
use thiserror::Error;

/// Error types for driver operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriverError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Driver configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Bus communication error
    #[error("Communication error: {0}")]
    CommunicationError(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn ServoDriver>;

/// Optional driver diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverDiagnostics {
    /// Successful position writes
    pub writes: u64,
    /// Failed position writes
    pub failed_writes: u64,
    /// Driver-specific diagnostics (free-form)
    pub custom: Option<String>,
}

/// Trait defining the interface for servo bus drivers.
///
/// The gait engine drives the robot exclusively through this trait; the
/// bus protocol lives entirely behind it.
///
/// # Lifecycle
///
/// 1. `init()` - Called once with the bus settings
/// 2. `initialize()` - Called once per servo before any gait executes
/// 3. `write()` - Called for every joint on every tick
/// 4. `shutdown()` - Called when the engine releases the bus
///
/// # Timing Contracts
///
/// | Operation | Max Duration | Constraint |
/// |-----------|--------------|------------|
/// | `init()` | seconds | None (before motion) |
/// | `write()` | dt / 8 | Must not block indefinitely |
/// | `shutdown()` | 1 second | None (after motion) |
pub trait ServoDriver: Send + Sync {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Prepare the bus (open the port, parse driver-specific settings).
    ///
    /// # Errors
    /// Return `DriverError::InitFailed` if the bus cannot be opened,
    /// `DriverError::ConfigError` for unusable driver settings.
    fn init(&mut self, bus: &BusConfig) -> Result<(), DriverError>;

    /// Configure one servo's operating mode, acceleration and speed.
    fn initialize(
        &mut self,
        id: ServoId,
        mode: ServoMode,
        acceleration: u16,
        speed: u16,
    ) -> Result<(), DriverError>;

    /// Convert an angle in degrees to the servo's native position unit.
    ///
    /// Pure affine transform; trim is applied by the caller afterwards.
    fn angle_to_unit(&self, angle_degrees: f64) -> RawUnit;

    /// Command servo `id` to `position`.
    ///
    /// # Errors
    /// `DriverError::CommunicationError` on transport failure.
    fn write(&mut self, id: ServoId, position: RawUnit) -> Result<(), DriverError>;

    /// Read the supply voltage seen by servo `id` [V]. Diagnostics only.
    fn read_voltage(&mut self, id: ServoId) -> Result<f64, DriverError>;

    /// Release the bus.
    /// Default: nothing to release.
    fn shutdown(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    /// Get driver-specific diagnostics.
    /// Default: None
    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullDriver;

    impl ServoDriver for NullDriver {
        fn name(&self) -> &'static str {
            "null"
        }

        fn version(&self) -> &'static str {
            "0.1.0"
        }

        fn init(&mut self, _bus: &BusConfig) -> Result<(), DriverError> {
            Ok(())
        }

        fn initialize(
            &mut self,
            _id: ServoId,
            _mode: ServoMode,
            _acceleration: u16,
            _speed: u16,
        ) -> Result<(), DriverError> {
            Ok(())
        }

        fn angle_to_unit(&self, angle_degrees: f64) -> RawUnit {
            angle_degrees.round() as RawUnit
        }

        fn write(&mut self, _id: ServoId, _position: RawUnit) -> Result<(), DriverError> {
            Ok(())
        }

        fn read_voltage(&mut self, _id: ServoId) -> Result<f64, DriverError> {
            Ok(0.0)
        }
    }

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::CommunicationError("timeout on servo 3".to_string());
        assert!(err.to_string().contains("servo 3"));

        let err = DriverError::DriverNotFound("st3215".to_string());
        assert!(err.to_string().contains("st3215"));
    }

    #[test]
    fn test_default_methods() {
        let mut driver: Box<dyn ServoDriver> = Box::new(NullDriver);
        assert!(driver.diagnostics().is_none());
        assert!(driver.shutdown().is_ok());
        assert_eq!(driver.angle_to_unit(89.6), 90);
    }

    #[test]
    fn test_driver_diagnostics_default() {
        let diag = DriverDiagnostics::default();
        assert_eq!(diag.writes, 0);
        assert_eq!(diag.failed_writes, 0);
        assert!(diag.custom.is_none());
    }
}
