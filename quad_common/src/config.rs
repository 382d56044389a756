//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the robot's TOML
//! configuration: per-servo calibration, gait table overrides, loop timing
//! and servo bus settings. Every section has compiled-in defaults, so an
//! empty file yields the tuned robot.
//!
//! # Usage
//!
//! ```rust,no_run
//! use quad_common::config::{ConfigError, RobotConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = RobotConfig::from_file(Path::new("robot.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{
    DEFAULT_ACCELERATION, DEFAULT_CYCLE_DURATION, DEFAULT_DIAGNOSTIC_STRIDE, DEFAULT_DRIVER,
    DEFAULT_DT, DEFAULT_PORT, DEFAULT_SETTLE_TIME, DEFAULT_SPEED, MAX_PERIOD,
};
use crate::gait::{GaitParams, GaitTable};
use crate::servo::{DEFAULT_SERVOS, ServoConfig, ServoTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// A required table entry is absent.
    #[error("Missing configuration entry: {0}")]
    MissingEntry(String),

    /// Gait mode name not recognized.
    #[error("Unknown gait mode: {0}")]
    UnknownGaitMode(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Filter directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Common fields of the application configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "quad-gait"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "quad-gait".to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ensure a duration in seconds is finite, strictly positive and at most
/// `MAX_PERIOD`.
pub fn validate_period(name: &str, seconds: f64) -> Result<(), ConfigError> {
    if !seconds.is_finite() || seconds <= 0.0 || seconds > MAX_PERIOD {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be > 0 and <= {MAX_PERIOD}s (got {seconds})"
        )));
    }
    Ok(())
}

fn default_dt() -> f64 {
    DEFAULT_DT
}
fn default_cycle_duration() -> f64 {
    DEFAULT_CYCLE_DURATION
}
fn default_diagnostic_stride() -> u32 {
    DEFAULT_DIAGNOSTIC_STRIDE
}
fn default_settle_time() -> f64 {
    DEFAULT_SETTLE_TIME
}
fn default_driver() -> String {
    DEFAULT_DRIVER.to_string()
}
fn default_port() -> String {
    DEFAULT_PORT.to_string()
}
fn default_acceleration() -> u16 {
    DEFAULT_ACCELERATION
}
fn default_speed() -> u16 {
    DEFAULT_SPEED
}
fn default_servos() -> Vec<ServoConfig> {
    DEFAULT_SERVOS.to_vec()
}

/// Execution loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    /// Tick period [s] (default: 0.05).
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Gait cycle duration used when a mode has none [s] (default: 2.0).
    #[serde(default = "default_cycle_duration")]
    pub cycle_duration: f64,

    /// Emit a diagnostic record every N ticks (default: 10).
    #[serde(default = "default_diagnostic_stride")]
    pub diagnostic_stride: u32,

    /// Wait after commanding the neutral pose [s] (default: 1.0).
    #[serde(default = "default_settle_time")]
    pub settle_time: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            cycle_duration: DEFAULT_CYCLE_DURATION,
            diagnostic_stride: DEFAULT_DIAGNOSTIC_STRIDE,
            settle_time: DEFAULT_SETTLE_TIME,
        }
    }
}

impl TimingConfig {
    /// Validate timing bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_period("dt", self.dt)?;
        validate_period("cycle_duration", self.cycle_duration)?;
        if self.diagnostic_stride == 0 {
            return Err(ConfigError::ValidationError(
                "diagnostic_stride must be at least 1".to_string(),
            ));
        }
        if !self.settle_time.is_finite() || self.settle_time < 0.0 || self.settle_time > MAX_PERIOD
        {
            return Err(ConfigError::ValidationError(format!(
                "settle_time must be >= 0 and <= {MAX_PERIOD}s (got {})",
                self.settle_time
            )));
        }
        Ok(())
    }
}

/// Servo operating mode set during bus initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServoMode {
    /// Closed-loop position control.
    #[default]
    Position,
    /// Continuous rotation.
    Wheel,
}

impl ServoMode {
    /// Mode register value on the bus.
    pub const fn code(self) -> u8 {
        match self {
            ServoMode::Position => 0,
            ServoMode::Wheel => 1,
        }
    }
}

/// Servo bus settings.
///
/// # TOML Example
///
/// ```toml
/// [bus]
/// driver = "simulation"
/// port = "/dev/ttyUSB0"
/// acceleration = 250
/// speed = 2400
///
/// [bus.driver_config.simulation]
/// fail_ids = [3]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Driver to load (default: "simulation").
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Serial port of the bus.
    #[serde(default = "default_port")]
    pub port: String,

    /// Operating mode applied to every servo.
    #[serde(default)]
    pub mode: ServoMode,

    /// Acceleration applied to every servo.
    #[serde(default = "default_acceleration")]
    pub acceleration: u16,

    /// Speed applied to every servo.
    #[serde(default = "default_speed")]
    pub speed: u16,

    /// Per-driver configuration sections.
    /// Key = driver name, Value = driver-specific TOML table.
    #[serde(default)]
    pub driver_config: HashMap<String, toml::Value>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            port: default_port(),
            mode: ServoMode::default(),
            acceleration: DEFAULT_ACCELERATION,
            speed: DEFAULT_SPEED,
            driver_config: HashMap::new(),
        }
    }
}

impl BusConfig {
    /// Validate bus settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "bus.driver cannot be empty".to_string(),
            ));
        }
        if self.speed == 0 {
            return Err(ConfigError::ValidationError(
                "bus.speed must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Driver-specific section for `driver`, if any.
    pub fn driver_section(&self, driver: &str) -> Option<&toml::Value> {
        self.driver_config.get(driver)
    }
}

/// Top-level robot configuration.
///
/// Loaded from TOML at startup, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RobotConfig {
    /// Logging and identity.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Loop timing.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Servo bus.
    #[serde(default)]
    pub bus: BusConfig,

    /// Calibration of all eight servos (default: compiled-in calibration).
    #[serde(default = "default_servos")]
    pub servos: Vec<ServoConfig>,

    /// Gait table overrides keyed by mode name.
    #[serde(default)]
    pub gaits: BTreeMap<String, GaitParams>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            timing: TimingConfig::default(),
            bus: BusConfig::default(),
            servos: default_servos(),
            gaits: BTreeMap::new(),
        }
    }
}

impl RobotConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section, including the derived tables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.timing.validate()?;
        self.bus.validate()?;
        self.servo_table()?;
        self.gait_table()?;
        Ok(())
    }

    /// Build the servo table.
    pub fn servo_table(&self) -> Result<ServoTable, ConfigError> {
        ServoTable::from_configs(&self.servos)
    }

    /// Build the gait table (built-ins plus overrides).
    pub fn gait_table(&self) -> Result<GaitTable, ConfigError> {
        GaitTable::with_overrides(&self.gaits)
    }
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gait::Waveform;
    use crate::types::GaitMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            let parsed: TestWrapper =
                toml::from_str(&format!("level = \"{}\"", level.as_str())).unwrap();
            assert_eq!(parsed.level, level);
        }
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = RobotConfig::parse("").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.timing, TimingConfig::default());
        assert_eq!(config.bus.acceleration, 250);
        assert_eq!(config.bus.speed, 2400);
        assert_eq!(config.servo_table().unwrap(), ServoTable::builtin());
        assert_eq!(config.gait_table().unwrap(), GaitTable::builtin());
    }

    #[test]
    fn test_timing_rejects_non_positive_dt() {
        let timing = TimingConfig {
            dt: 0.0,
            ..TimingConfig::default()
        };
        assert!(timing.validate().is_err());

        let timing = TimingConfig {
            cycle_duration: -1.0,
            ..TimingConfig::default()
        };
        assert!(timing.validate().is_err());

        let timing = TimingConfig {
            diagnostic_stride: 0,
            ..TimingConfig::default()
        };
        assert!(timing.validate().is_err());
    }

    #[test]
    fn test_timing_rejects_oversized_periods() {
        for timing in [
            TimingConfig {
                dt: 1e20,
                ..TimingConfig::default()
            },
            TimingConfig {
                cycle_duration: MAX_PERIOD * 2.0,
                ..TimingConfig::default()
            },
            TimingConfig {
                settle_time: 1e30,
                ..TimingConfig::default()
            },
        ] {
            assert!(matches!(
                timing.validate(),
                Err(ConfigError::ValidationError(_))
            ));
        }

        let timing = TimingConfig {
            dt: MAX_PERIOD,
            cycle_duration: MAX_PERIOD,
            settle_time: MAX_PERIOD,
            ..TimingConfig::default()
        };
        assert!(timing.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = RobotConfig::parse("[timing]\ndt = 0.1\nfrequency = 20\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_gait_override_from_toml() {
        let config = RobotConfig::parse(
            r#"
[gaits.trot-forward]
waveform = "trot"
cycle_duration = 1.0
x_amplitude = [20.0, -20.0, 20.0, -20.0]
z_amplitude = [15.0, -15.0, -15.0, 15.0]
x_offset = [105.0, 75.0, 45.0, 135.0]
z_offset = [90.0, 90.0, 90.0, 90.0]
phase_offset = [0.5, 0.0, 0.0, 0.5]
"#,
        )
        .unwrap();
        let table = config.gait_table().unwrap();
        let params = table.get(GaitMode::TrotForward);
        assert_eq!(params.waveform, Waveform::Trot);
        assert_eq!(params.x_amplitude[0], 20.0);
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = RobotConfig::load(Path::new("/nonexistent/path/robot.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = RobotConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_file_validates() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[timing]\ndt = -0.05\n").unwrap();
        file.flush().unwrap();

        let result = RobotConfig::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
