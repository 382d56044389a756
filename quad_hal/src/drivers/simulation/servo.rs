//! Simulated servo state and driver settings.

use quad_common::config::ServoMode;
use quad_common::driver::DriverError;
use quad_common::types::RawUnit;
use serde::Deserialize;

fn default_full_scale_degrees() -> f64 {
    360.0
}
fn default_full_scale_units() -> RawUnit {
    4096
}
fn default_voltage() -> f64 {
    7.4
}

/// Settings read from `[bus.driver_config.simulation]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSettings {
    /// Angle mapped to `full_scale_units` [deg].
    #[serde(default = "default_full_scale_degrees")]
    pub full_scale_degrees: f64,
    /// Raw units per full scale.
    #[serde(default = "default_full_scale_units")]
    pub full_scale_units: RawUnit,
    /// Reported supply voltage [V].
    #[serde(default = "default_voltage")]
    pub voltage: f64,
    /// Servo ids whose writes and reads fail.
    #[serde(default)]
    pub fail_ids: Vec<u8>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            full_scale_degrees: default_full_scale_degrees(),
            full_scale_units: default_full_scale_units(),
            voltage: default_voltage(),
            fail_ids: Vec::new(),
        }
    }
}

impl SimulationSettings {
    /// Parse settings from a driver config section.
    pub fn from_value(value: &toml::Value) -> Result<Self, DriverError> {
        let settings: Self = value
            .clone()
            .try_into()
            .map_err(|e| DriverError::ConfigError(format!("simulation: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the angle scale.
    pub fn validate(&self) -> Result<(), DriverError> {
        if !self.full_scale_degrees.is_finite() || self.full_scale_degrees <= 0.0 {
            return Err(DriverError::ConfigError(format!(
                "simulation: full_scale_degrees must be > 0 (got {})",
                self.full_scale_degrees
            )));
        }
        if self.full_scale_units <= 0 {
            return Err(DriverError::ConfigError(format!(
                "simulation: full_scale_units must be > 0 (got {})",
                self.full_scale_units
            )));
        }
        Ok(())
    }

    /// Affine degrees → raw units.
    #[inline]
    pub fn angle_to_unit(&self, angle_degrees: f64) -> RawUnit {
        (angle_degrees / self.full_scale_degrees * self.full_scale_units as f64).round() as RawUnit
    }
}

/// State of one simulated servo.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulatedServo {
    /// Operating mode, `None` until initialized.
    pub mode: Option<ServoMode>,
    /// Configured acceleration.
    pub acceleration: u16,
    /// Configured speed.
    pub speed: u16,
    /// Last commanded position.
    pub position: Option<RawUnit>,
    /// Number of accepted writes.
    pub writes: u64,
}

impl SimulatedServo {
    /// Whether `initialize()` has been called for this servo.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.mode.is_some()
    }
}
