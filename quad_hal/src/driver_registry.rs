//! Driver registry for servo bus drivers.
//!
//! Maps the `bus.driver` name of the robot configuration to a factory.
//! Names are matched case-insensitively, so `driver = "Simulation"` selects
//! the `simulation` driver.

use quad_common::config::BusConfig;
use quad_common::driver::{DriverError, DriverFactory, ServoDriver};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Registry of available servo bus drivers.
///
/// Constructed at startup and queried by name or with a whole `[bus]`
/// section through [`DriverRegistry::open`].
#[derive(Default)]
pub struct DriverRegistry {
    factories: BTreeMap<String, DriverFactory>,
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in driver.
    pub fn with_builtin() -> Result<Self, DriverError> {
        let mut registry = Self::new();
        crate::drivers::register_all_drivers(&mut registry)?;
        Ok(registry)
    }

    /// Register a driver factory.
    ///
    /// # Errors
    /// `DriverError::ConfigError` if the name is empty or already taken.
    pub fn register(&mut self, name: &str, factory: DriverFactory) -> Result<(), DriverError> {
        let key = normalize(name);
        if key.is_empty() {
            return Err(DriverError::ConfigError(
                "driver name cannot be empty".to_string(),
            ));
        }
        if self.factories.contains_key(&key) {
            return Err(DriverError::ConfigError(format!(
                "driver '{key}' is already registered"
            )));
        }
        self.factories.insert(key, factory);
        Ok(())
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// `DriverError::DriverNotFound` naming the registered drivers.
    pub fn create_driver(&self, name: &str) -> Result<Box<dyn ServoDriver>, DriverError> {
        let factory = self.factories.get(&normalize(name)).ok_or_else(|| {
            DriverError::DriverNotFound(format!(
                "'{name}' (available: {})",
                self.list_drivers().join(", ")
            ))
        })?;
        Ok(factory())
    }

    /// Create the driver selected by a `[bus]` section.
    ///
    /// `[bus.driver_config.<name>]` tables for unregistered drivers are
    /// reported with a warning since they are never read.
    ///
    /// # Errors
    /// - `DriverError::DriverNotFound` for an unknown `bus.driver`
    /// - `DriverError::ConfigError` if the factory builds a driver reporting
    ///   a different name
    pub fn open(&self, bus: &BusConfig) -> Result<Box<dyn ServoDriver>, DriverError> {
        for section in bus.driver_config.keys() {
            if !self.factories.contains_key(&normalize(section)) {
                warn!("Ignoring [bus.driver_config.{}]: no such driver", section);
            }
        }

        let driver = self.create_driver(&bus.driver)?;
        let requested = normalize(&bus.driver);
        if normalize(driver.name()) != requested {
            return Err(DriverError::ConfigError(format!(
                "factory for '{requested}' built driver '{}'",
                driver.name()
            )));
        }
        debug!(
            "Opened '{}' driver v{} for port {}",
            driver.name(),
            driver.version(),
            bus.port
        );
        Ok(driver)
    }

    /// Registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
