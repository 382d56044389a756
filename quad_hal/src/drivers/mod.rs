//! Servo bus driver implementations.
//!
//! - [`simulation`] - Software bus for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `ServoDriver` trait from `quad_common::driver`
//! 3. Register the driver in `register_all_drivers()`

pub mod simulation;

use crate::driver_registry::DriverRegistry;
use quad_common::driver::DriverError;

/// Register all built-in drivers.
pub fn register_all_drivers(registry: &mut DriverRegistry) -> Result<(), DriverError> {
    registry.register(simulation::DRIVER_NAME, simulation::create_driver)
}
