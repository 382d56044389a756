//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements the `ServoDriver` trait with an
//! in-memory bus: every servo remembers its configuration and last
//! commanded position.

use super::servo::{SimulatedServo, SimulationSettings};
use super::DRIVER_NAME;
use quad_common::config::{BusConfig, ServoMode};
use quad_common::consts::SERVO_COUNT;
use quad_common::driver::{DriverDiagnostics, DriverError, ServoDriver};
use quad_common::types::{RawUnit, ServoId};
use tracing::{debug, info, warn};

/// Simulation driver implementing the ServoDriver trait.
pub struct SimulationDriver {
    /// Driver version
    version: &'static str,
    /// Set by `init()`
    initialized: bool,
    /// Scale, voltage and fault injection
    settings: SimulationSettings,
    /// Per-servo state, indexed by `ServoId::index()`
    servos: [SimulatedServo; SERVO_COUNT],
    /// Failed writes (injected faults included)
    failed_writes: u64,
}

impl SimulationDriver {
    /// Create a new simulation driver instance.
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            initialized: false,
            settings: SimulationSettings::default(),
            servos: [SimulatedServo::default(); SERVO_COUNT],
            failed_writes: 0,
        }
    }

    /// State of servo `id`.
    pub fn servo(&self, id: ServoId) -> &SimulatedServo {
        &self.servos[id.index()]
    }

    /// Last commanded position of servo `id`.
    pub fn position(&self, id: ServoId) -> Option<RawUnit> {
        self.servos[id.index()].position
    }

    /// Active settings.
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    fn ensure_initialized(&self) -> Result<(), DriverError> {
        if self.initialized {
            Ok(())
        } else {
            Err(DriverError::InitFailed(
                "simulation bus not initialized".to_string(),
            ))
        }
    }

    fn is_faulty(&self, id: ServoId) -> bool {
        self.settings.fail_ids.contains(&id.get())
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ServoDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, bus: &BusConfig) -> Result<(), DriverError> {
        self.settings = match bus.driver_section(DRIVER_NAME) {
            Some(section) => SimulationSettings::from_value(section)?,
            None => SimulationSettings::default(),
        };

        for raw in &self.settings.fail_ids {
            if ServoId::new(*raw).is_none() {
                warn!("simulation: fail_ids entry {} is not a valid servo id", raw);
            }
        }

        self.servos = [SimulatedServo::default(); SERVO_COUNT];
        self.failed_writes = 0;
        self.initialized = true;

        info!(
            "Simulation bus ready on {} ({} units per {} deg, faults on {:?})",
            bus.port,
            self.settings.full_scale_units,
            self.settings.full_scale_degrees,
            self.settings.fail_ids
        );
        Ok(())
    }

    fn initialize(
        &mut self,
        id: ServoId,
        mode: ServoMode,
        acceleration: u16,
        speed: u16,
    ) -> Result<(), DriverError> {
        self.ensure_initialized()?;
        if self.is_faulty(id) {
            return Err(DriverError::CommunicationError(format!(
                "servo {id} did not answer"
            )));
        }

        let servo = &mut self.servos[id.index()];
        servo.mode = Some(mode);
        servo.acceleration = acceleration;
        servo.speed = speed;
        debug!(
            "simulation: servo {} mode={:?} acc={} speed={}",
            id, mode, acceleration, speed
        );
        Ok(())
    }

    fn angle_to_unit(&self, angle_degrees: f64) -> RawUnit {
        self.settings.angle_to_unit(angle_degrees)
    }

    fn write(&mut self, id: ServoId, position: RawUnit) -> Result<(), DriverError> {
        self.ensure_initialized()?;
        if self.is_faulty(id) || !self.servos[id.index()].is_initialized() {
            self.failed_writes += 1;
            return Err(DriverError::CommunicationError(format!(
                "servo {id} did not acknowledge position {position}"
            )));
        }

        let servo = &mut self.servos[id.index()];
        servo.position = Some(position);
        servo.writes += 1;
        Ok(())
    }

    fn read_voltage(&mut self, id: ServoId) -> Result<f64, DriverError> {
        self.ensure_initialized()?;
        if self.is_faulty(id) {
            return Err(DriverError::CommunicationError(format!(
                "servo {id} did not answer"
            )));
        }
        Ok(self.settings.voltage)
    }

    fn shutdown(&mut self) -> Result<(), DriverError> {
        info!(
            "Shutting down simulation driver ({} writes, {} failed)",
            self.servos.iter().map(|s| s.writes).sum::<u64>(),
            self.failed_writes
        );
        self.initialized = false;
        Ok(())
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        let positions: Vec<String> = self
            .servos
            .iter()
            .zip(ServoId::all())
            .map(|(servo, id)| match servo.position {
                Some(p) => format!("{id}={p}"),
                None => format!("{id}=-"),
            })
            .collect();

        Some(DriverDiagnostics {
            writes: self.servos.iter().map(|s| s.writes).sum(),
            failed_writes: self.failed_writes,
            custom: Some(positions.join(" ")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u8) -> ServoId {
        ServoId::new(raw).unwrap()
    }

    fn ready_driver(bus: &BusConfig) -> SimulationDriver {
        let mut driver = SimulationDriver::new();
        driver.init(bus).unwrap();
        for servo in ServoId::all() {
            let _ = driver.initialize(servo, bus.mode, bus.acceleration, bus.speed);
        }
        driver
    }

    #[test]
    fn write_before_init_fails() {
        let mut driver = SimulationDriver::new();
        assert!(matches!(
            driver.write(id(1), 100),
            Err(DriverError::InitFailed(_))
        ));
    }

    #[test]
    fn write_to_uninitialized_servo_fails() {
        let mut driver = SimulationDriver::new();
        driver.init(&BusConfig::default()).unwrap();
        assert!(matches!(
            driver.write(id(2), 100),
            Err(DriverError::CommunicationError(_))
        ));
    }

    #[test]
    fn initialize_records_bus_settings() {
        let bus = BusConfig::default();
        let driver = ready_driver(&bus);
        let servo = driver.servo(id(4));
        assert_eq!(servo.mode, Some(ServoMode::Position));
        assert_eq!(servo.acceleration, 250);
        assert_eq!(servo.speed, 2400);
    }

    #[test]
    fn writes_are_tracked() {
        let mut driver = ready_driver(&BusConfig::default());
        driver.write(id(3), 1000).unwrap();
        driver.write(id(3), 1010).unwrap();
        assert_eq!(driver.position(id(3)), Some(1010));
        assert_eq!(driver.servo(id(3)).writes, 2);
        assert_eq!(driver.position(id(1)), None);

        let diag = driver.diagnostics().unwrap();
        assert_eq!(diag.writes, 2);
        assert!(diag.custom.unwrap().contains("3=1010"));
    }

    #[test]
    fn injected_faults_fail_writes_and_reads() {
        let mut bus = BusConfig::default();
        let table: toml::Table = toml::from_str("fail_ids = [5]").unwrap();
        bus.driver_config
            .insert(DRIVER_NAME.to_string(), toml::Value::Table(table));

        let mut driver = ready_driver(&bus);
        assert!(driver.write(id(5), 10).is_err());
        assert!(driver.read_voltage(id(5)).is_err());
        assert!(driver.write(id(6), 10).is_ok());
        assert_eq!(driver.read_voltage(id(6)).unwrap(), 7.4);
        assert_eq!(driver.diagnostics().unwrap().failed_writes, 1);
    }

    #[test]
    fn shutdown_closes_bus() {
        let mut driver = ready_driver(&BusConfig::default());
        driver.shutdown().unwrap();
        assert!(driver.write(id(1), 0).is_err());
    }
}
