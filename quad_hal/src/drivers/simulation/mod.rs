//! Simulation driver module.
//!
//! Software servo bus for development and testing without physical
//! hardware. Positions are tracked per servo; communication failures can be
//! injected per servo id through the driver configuration.

mod driver;
mod servo;

pub use driver::SimulationDriver;
pub use servo::{SimulatedServo, SimulationSettings};

use quad_common::driver::ServoDriver;

/// Registered name of the simulation driver.
pub const DRIVER_NAME: &str = "simulation";

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn ServoDriver> {
    Box::new(SimulationDriver::new())
}
