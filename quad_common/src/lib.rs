//! Quadruped Common Library
//!
//! Shared types, static tables and configuration loading for the
//! quadruped gait workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Workspace-wide numeric limits and tuned defaults
//! - [`types`] - Closed enums for legs, joint axes, servo ids and gait modes
//! - [`gait`] - Per-mode gait parameters and the gait parameter table
//! - [`servo`] - Per-servo limits, trims, neutral pose and the servo table
//! - [`config`] - TOML configuration loading and validation
//! - [`driver`] - `ServoDriver` trait implemented by bus drivers
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust,no_run
//! use quad_common::config::RobotConfig;
//! use std::path::Path;
//!
//! let config = RobotConfig::from_file(Path::new("config/robot.toml")).unwrap();
//! let gaits = config.gait_table().unwrap();
//! let servos = config.servo_table().unwrap();
//! ```

pub mod config;
pub mod consts;
pub mod driver;
pub mod gait;
pub mod prelude;
pub mod servo;
pub mod types;
