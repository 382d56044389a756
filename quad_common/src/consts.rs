//! System-wide constants for the quadruped workspace.
//!
//! Single source of truth for table sizes and tuned defaults.
//! Imported by all crates; never duplicate these values elsewhere.

use static_assertions::const_assert_eq;

/// Number of legs.
pub const LEG_COUNT: usize = 4;

/// Number of driven joints per leg (horizontal reach, vertical lift).
pub const AXIS_COUNT: usize = 2;

/// Number of servos on the bus.
pub const SERVO_COUNT: usize = 8;

/// Number of gait modes.
pub const GAIT_MODE_COUNT: usize = 8;

const_assert_eq!(SERVO_COUNT, LEG_COUNT * AXIS_COUNT);

/// Default tick period [s].
pub const DEFAULT_DT: f64 = 0.05;

/// Default duration of one full gait cycle [s].
pub const DEFAULT_CYCLE_DURATION: f64 = 2.0;

/// Emit one diagnostic record every N ticks.
pub const DEFAULT_DIAGNOSTIC_STRIDE: u32 = 10;

/// Time given to the servos to reach the neutral pose [s].
pub const DEFAULT_SETTLE_TIME: f64 = 1.0;

/// Longest accepted tick period, cycle duration or settle time [s].
pub const MAX_PERIOD: f64 = 3600.0;

/// Default servo acceleration (bus units).
pub const DEFAULT_ACCELERATION: u16 = 250;

/// Default servo speed (bus units).
pub const DEFAULT_SPEED: u16 = 2400;

/// Default bus driver name.
pub const DEFAULT_DRIVER: &str = "simulation";

/// Default serial port of the servo bus.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/quad/robot.toml";
