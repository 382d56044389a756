//! # Quadruped HAL Library
//!
//! Servo bus drivers behind the `ServoDriver` trait defined in
//! `quad_common::driver`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐    ┌──────────────────┐    ┌───────────────────┐
//! │  Gait engine   │───►│  ServoDriver     │◄───│  DriverRegistry   │
//! │  (quad_gait)   │    │  (trait object)  │    │  name → factory   │
//! └────────────────┘    └──────────────────┘    └───────────────────┘
//! ```

#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::DriverRegistry;
