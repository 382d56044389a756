//! Servo output stage: limit, convert, write, and report.
//!
//! A failed or clamped write never aborts a tick. Every servo command
//! produces a `ServoOutcome`; a tick's outcomes are gathered into a
//! `TickReport` which logs at most one warning.

use crate::limiter::AngleLimiter;
use crate::mapper::ServoMapper;
use bitflags::bitflags;
use quad_common::consts::SERVO_COUNT;
use quad_common::driver::{DriverError, ServoDriver};
use quad_common::types::{RawUnit, ServoId};
use std::fmt;
use tracing::warn;

bitflags! {
    /// Summary of what went wrong during one tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TickFlags: u8 {
        /// At least one requested angle was out of range.
        const CLAMPED      = 0x01;
        /// At least one write failed.
        const WRITE_FAILED = 0x02;
    }
}

/// Result of commanding one servo.
#[derive(Debug, Clone, PartialEq)]
pub enum ServoOutcome {
    /// Written as requested.
    Written {
        id: ServoId,
        angle: f64,
        unit: RawUnit,
    },
    /// Written after clamping `requested` to `angle`.
    Clamped {
        id: ServoId,
        requested: f64,
        angle: f64,
        unit: RawUnit,
    },
    /// The bus rejected the write. `angle` is the (possibly clamped) angle
    /// that was attempted.
    CommunicationFailure {
        id: ServoId,
        requested: f64,
        angle: f64,
        error: DriverError,
    },
}

impl ServoOutcome {
    /// Servo the outcome belongs to.
    pub fn id(&self) -> ServoId {
        match self {
            ServoOutcome::Written { id, .. }
            | ServoOutcome::Clamped { id, .. }
            | ServoOutcome::CommunicationFailure { id, .. } => *id,
        }
    }

    /// Flags this outcome contributes to its tick.
    pub fn flags(&self) -> TickFlags {
        match self {
            ServoOutcome::Written { .. } => TickFlags::empty(),
            ServoOutcome::Clamped { .. } => TickFlags::CLAMPED,
            ServoOutcome::CommunicationFailure {
                requested, angle, ..
            } => {
                let mut flags = TickFlags::WRITE_FAILED;
                if requested.to_bits() != angle.to_bits() {
                    flags |= TickFlags::CLAMPED;
                }
                flags
            }
        }
    }

    /// Raw unit written, if the write succeeded.
    pub fn unit(&self) -> Option<RawUnit> {
        match self {
            ServoOutcome::Written { unit, .. } | ServoOutcome::Clamped { unit, .. } => Some(*unit),
            ServoOutcome::CommunicationFailure { .. } => None,
        }
    }
}

impl fmt::Display for ServoOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServoOutcome::Written { id, angle, unit } => {
                write!(f, "servo {id}: {angle:.1}° ({unit})")
            }
            ServoOutcome::Clamped {
                id,
                requested,
                angle,
                unit,
            } => write!(f, "servo {id}: {requested:.1}° clamped to {angle:.1}° ({unit})"),
            ServoOutcome::CommunicationFailure { id, angle, error, .. } => {
                write!(f, "servo {id}: {angle:.1}° not written ({error})")
            }
        }
    }
}

/// Clamp `requested`, convert it and write it to servo `id`.
pub fn command_servo(
    limiter: &AngleLimiter,
    mapper: &ServoMapper,
    driver: &mut dyn ServoDriver,
    id: ServoId,
    requested: f64,
) -> ServoOutcome {
    let limited = limiter.clamp(id, requested);
    match mapper.write(driver, id, limited.angle) {
        Ok(unit) if limited.was_clamped => ServoOutcome::Clamped {
            id,
            requested,
            angle: limited.angle,
            unit,
        },
        Ok(unit) => ServoOutcome::Written {
            id,
            angle: limited.angle,
            unit,
        },
        Err(error) => ServoOutcome::CommunicationFailure {
            id,
            requested,
            angle: limited.angle,
            error,
        },
    }
}

/// Outcomes of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    step: u64,
    outcomes: Vec<ServoOutcome>,
    flags: TickFlags,
}

impl TickReport {
    /// Empty report for tick `step`.
    pub fn new(step: u64) -> Self {
        Self {
            step,
            outcomes: Vec::with_capacity(SERVO_COUNT),
            flags: TickFlags::empty(),
        }
    }

    /// Record one command and merge its flags.
    pub fn push(&mut self, outcome: ServoOutcome) {
        self.flags |= outcome.flags();
        self.outcomes.push(outcome);
    }

    /// Tick index.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Outcomes in command order.
    pub fn outcomes(&self) -> &[ServoOutcome] {
        &self.outcomes
    }

    pub fn flags(&self) -> TickFlags {
        self.flags
    }

    /// No clamping and no failed writes.
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }

    /// Outcome for servo `id`, if it was commanded.
    pub fn outcome(&self, id: ServoId) -> Option<&ServoOutcome> {
        self.outcomes.iter().find(|o| o.id() == id)
    }

    /// Number of failed writes.
    pub fn failed_writes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ServoOutcome::CommunicationFailure { .. }))
            .count()
    }

    /// Emit one aggregated warning if anything went wrong.
    pub fn log(&self, context: &str) {
        if self.is_clean() {
            return;
        }
        let details: Vec<String> = self
            .outcomes
            .iter()
            .filter(|o| !o.flags().is_empty())
            .map(ToString::to_string)
            .collect();
        warn!(
            "{} tick {}: {:?}: {}",
            context,
            self.step,
            self.flags,
            details.join("; ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quad_common::config::{BusConfig, ServoMode};
    use quad_common::servo::ServoTable;

    /// One unit per degree; rejects writes to `failing`.
    struct FlakyDriver {
        failing: Option<ServoId>,
    }

    impl ServoDriver for FlakyDriver {
        fn name(&self) -> &'static str {
            "flaky"
        }
        fn version(&self) -> &'static str {
            "0.0.0"
        }
        fn init(&mut self, _bus: &BusConfig) -> Result<(), DriverError> {
            Ok(())
        }
        fn initialize(&mut self, _: ServoId, _: ServoMode, _: u16, _: u16) -> Result<(), DriverError> {
            Ok(())
        }
        fn angle_to_unit(&self, angle_degrees: f64) -> RawUnit {
            angle_degrees.round() as RawUnit
        }
        fn write(&mut self, id: ServoId, _position: RawUnit) -> Result<(), DriverError> {
            if Some(id) == self.failing {
                Err(DriverError::CommunicationError(format!("servo {id} timed out")))
            } else {
                Ok(())
            }
        }
        fn read_voltage(&mut self, _: ServoId) -> Result<f64, DriverError> {
            Ok(0.0)
        }
    }

    fn id(raw: u8) -> ServoId {
        ServoId::new(raw).unwrap()
    }

    fn stage() -> (AngleLimiter, ServoMapper) {
        let table = ServoTable::builtin();
        (AngleLimiter::new(&table), ServoMapper::new(&table))
    }

    #[test]
    fn in_range_write() {
        let (limiter, mapper) = stage();
        let mut driver = FlakyDriver { failing: None };
        let out = command_servo(&limiter, &mapper, &mut driver, id(2), 90.0);
        assert_eq!(
            out,
            ServoOutcome::Written {
                id: id(2),
                angle: 90.0,
                unit: 150
            }
        );
        assert!(out.flags().is_empty());
    }

    #[test]
    fn clamped_write_reports_both_angles() {
        let (limiter, mapper) = stage();
        let mut driver = FlakyDriver { failing: None };
        let out = command_servo(&limiter, &mapper, &mut driver, id(2), 200.0);
        assert_eq!(
            out,
            ServoOutcome::Clamped {
                id: id(2),
                requested: 200.0,
                angle: 140.0,
                unit: 200
            }
        );
        assert_eq!(out.flags(), TickFlags::CLAMPED);
    }

    #[test]
    fn failed_write_is_captured() {
        let (limiter, mapper) = stage();
        let mut driver = FlakyDriver {
            failing: Some(id(5)),
        };
        let out = command_servo(&limiter, &mapper, &mut driver, id(5), 500.0);
        assert!(matches!(
            out,
            ServoOutcome::CommunicationFailure { angle, .. } if angle == 105.0
        ));
        assert_eq!(out.flags(), TickFlags::WRITE_FAILED | TickFlags::CLAMPED);
        assert_eq!(out.unit(), None);
    }

    #[test]
    fn report_aggregates_flags() {
        let (limiter, mapper) = stage();
        let mut driver = FlakyDriver {
            failing: Some(id(3)),
        };
        let mut report = TickReport::new(7);
        report.push(command_servo(&limiter, &mapper, &mut driver, id(1), 100.0));
        assert!(report.is_clean());
        report.push(command_servo(&limiter, &mapper, &mut driver, id(2), 10.0));
        report.push(command_servo(&limiter, &mapper, &mut driver, id(3), 80.0));

        assert_eq!(report.step(), 7);
        assert_eq!(report.outcomes().len(), 3);
        assert!(report.flags().contains(TickFlags::CLAMPED | TickFlags::WRITE_FAILED));
        assert_eq!(report.failed_writes(), 1);
        assert!(matches!(
            report.outcome(id(2)),
            Some(ServoOutcome::Clamped { angle, .. }) if *angle == 30.0
        ));
        report.log("creep-forward");
    }

    #[test]
    fn outcome_display() {
        let out = ServoOutcome::Clamped {
            id: id(4),
            requested: 160.04,
            angle: 150.0,
            unit: 205,
        };
        assert_eq!(out.to_string(), "servo 4: 160.0° clamped to 150.0° (205)");
    }
}
