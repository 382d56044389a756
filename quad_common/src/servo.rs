//! Per-servo calibration and the servo table.
//!
//! Each physical servo has a bus id, a (leg, axis) position, a mechanical
//! angle range, a raw-unit trim and a neutral-pose angle. `ServoTable`
//! holds all eight, validated to cover the 4×2 joint space exactly once.

use crate::config::ConfigError;
use crate::consts::{AXIS_COUNT, LEG_COUNT, SERVO_COUNT};
use crate::types::{Axis, Leg, RawUnit, ServoId};
use serde::{Deserialize, Serialize};

/// Inclusive mechanical angle range of a servo [deg].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    /// Lower bound [deg].
    pub min: f64,
    /// Upper bound [deg].
    pub max: f64,
}

impl AngleRange {
    /// Whether `angle` lies within the range.
    #[inline]
    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.min && angle <= self.max
    }
}

/// Calibration of one servo.
///
/// # TOML Example
///
/// ```toml
/// [[servos]]
/// id = 1
/// leg = "front_left"
/// axis = "horizontal"
/// angle_min = 75.0
/// angle_max = 150.0
/// trim = 100
/// neutral = 100.0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServoConfig {
    /// Bus address.
    pub id: ServoId,
    /// Leg the servo belongs to.
    pub leg: Leg,
    /// Joint axis the servo drives.
    pub axis: Axis,
    /// Lowest allowed angle [deg].
    pub angle_min: f64,
    /// Highest allowed angle [deg].
    pub angle_max: f64,
    /// Assembly correction added after angle conversion [raw units].
    #[serde(default)]
    pub trim: RawUnit,
    /// Neutral-pose angle [deg].
    pub neutral: f64,
}

impl ServoConfig {
    /// Mechanical angle range.
    #[inline]
    pub fn range(&self) -> AngleRange {
        AngleRange {
            min: self.angle_min,
            max: self.angle_max,
        }
    }

    /// Validate a single servo entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.angle_min.is_finite() || !self.angle_max.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "servo {}: angle bounds must be finite",
                self.id
            )));
        }
        if self.angle_min >= self.angle_max {
            return Err(ConfigError::ValidationError(format!(
                "servo {}: angle_min ({}) must be below angle_max ({})",
                self.id, self.angle_min, self.angle_max
            )));
        }
        if !self.neutral.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "servo {}: neutral angle must be finite",
                self.id
            )));
        }
        Ok(())
    }
}

const fn servo(
    id: u8,
    leg: Leg,
    axis: Axis,
    angle_min: f64,
    angle_max: f64,
    trim: RawUnit,
    neutral: f64,
) -> ServoConfig {
    ServoConfig {
        id: ServoId::new_unchecked(id),
        leg,
        axis,
        angle_min,
        angle_max,
        trim,
        neutral,
    }
}

/// Calibrated servo set, in id order.
pub const DEFAULT_SERVOS: [ServoConfig; SERVO_COUNT] = [
    servo(1, Leg::FrontLeft, Axis::Horizontal, 75.0, 150.0, 100, 100.0),
    servo(2, Leg::FrontLeft, Axis::Vertical, 30.0, 140.0, 60, 90.0),
    servo(3, Leg::FrontRight, Axis::Horizontal, 30.0, 105.0, 140, 80.0),
    servo(4, Leg::FrontRight, Axis::Vertical, 40.0, 150.0, 55, 90.0),
    servo(5, Leg::RearLeft, Axis::Horizontal, 30.0, 105.0, 0, 60.0),
    servo(6, Leg::RearLeft, Axis::Vertical, 40.0, 150.0, 10, 90.0),
    servo(7, Leg::RearRight, Axis::Horizontal, 85.0, 150.0, 0, 120.0),
    servo(8, Leg::RearRight, Axis::Vertical, 30.0, 140.0, 40, 90.0),
];

/// Validated set of all eight servos.
///
/// Guarantees: every id in `1..=8` present once, every (leg, axis) pair
/// present once, every entry valid.
#[derive(Debug, Clone, PartialEq)]
pub struct ServoTable {
    /// Indexed by `ServoId::index()`.
    servos: [ServoConfig; SERVO_COUNT],
    /// Indexed by `[Leg::index()][Axis::index()]`.
    joints: [[ServoId; AXIS_COUNT]; LEG_COUNT],
}

impl ServoTable {
    /// Build the table from the compiled-in calibration.
    pub fn builtin() -> Self {
        let mut joints = [[ServoId::new_unchecked(ServoId::MIN); AXIS_COUNT]; LEG_COUNT];
        for cfg in &DEFAULT_SERVOS {
            joints[cfg.leg.index()][cfg.axis.index()] = cfg.id;
        }
        Self {
            servos: DEFAULT_SERVOS,
            joints,
        }
    }

    /// Build and validate a table from configuration entries (any order).
    ///
    /// # Errors
    /// `ConfigError::ValidationError` on an invalid entry, a duplicate id or
    /// joint, and `ConfigError::MissingEntry` if an id or joint is unmapped.
    pub fn from_configs(configs: &[ServoConfig]) -> Result<Self, ConfigError> {
        if configs.len() != SERVO_COUNT {
            return Err(ConfigError::ValidationError(format!(
                "expected {} servos, got {}",
                SERVO_COUNT,
                configs.len()
            )));
        }

        let mut by_id: [Option<ServoConfig>; SERVO_COUNT] = [None; SERVO_COUNT];
        let mut joints: [[Option<ServoId>; AXIS_COUNT]; LEG_COUNT] = [[None; AXIS_COUNT]; LEG_COUNT];

        for cfg in configs {
            cfg.validate()?;

            let slot = &mut by_id[cfg.id.index()];
            if slot.is_some() {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate servo id {}",
                    cfg.id
                )));
            }
            *slot = Some(*cfg);

            let joint = &mut joints[cfg.leg.index()][cfg.axis.index()];
            if let Some(existing) = joint {
                return Err(ConfigError::ValidationError(format!(
                    "servos {} and {} both drive {} {}",
                    existing, cfg.id, cfg.leg, cfg.axis
                )));
            }
            *joint = Some(cfg.id);
        }

        let mut servos = DEFAULT_SERVOS;
        for id in ServoId::all() {
            servos[id.index()] = by_id[id.index()]
                .ok_or_else(|| ConfigError::MissingEntry(format!("servo id {id}")))?;
        }

        let mut resolved = [[ServoId::new_unchecked(ServoId::MIN); AXIS_COUNT]; LEG_COUNT];
        for leg in Leg::ALL {
            for axis in Axis::ALL {
                resolved[leg.index()][axis.index()] = joints[leg.index()][axis.index()]
                    .ok_or_else(|| ConfigError::MissingEntry(format!("servo for {leg} {axis}")))?;
            }
        }

        Ok(Self {
            servos,
            joints: resolved,
        })
    }

    /// Calibration of servo `id`.
    #[inline]
    pub fn get(&self, id: ServoId) -> &ServoConfig {
        &self.servos[id.index()]
    }

    /// Servo driving `axis` of `leg`.
    #[inline]
    pub fn id_for(&self, leg: Leg, axis: Axis) -> ServoId {
        self.joints[leg.index()][axis.index()]
    }

    /// Iterate over all servos in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ServoConfig> {
        self.servos.iter()
    }
}

impl Default for ServoTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_matches_validated_construction() {
        let validated = ServoTable::from_configs(&DEFAULT_SERVOS).unwrap();
        assert_eq!(validated, ServoTable::builtin());
    }

    #[test]
    fn order_of_entries_does_not_matter() {
        let mut shuffled = DEFAULT_SERVOS;
        shuffled.reverse();
        let table = ServoTable::from_configs(&shuffled).unwrap();
        assert_eq!(table, ServoTable::builtin());
    }

    #[test]
    fn neutral_pose_lies_within_limits() {
        for cfg in ServoTable::builtin().iter() {
            assert!(cfg.range().contains(cfg.neutral), "servo {}", cfg.id);
        }
    }

    #[test]
    fn rejects_duplicate_id() {
        let mut configs = DEFAULT_SERVOS;
        configs[1].id = configs[0].id;
        assert!(matches!(
            ServoTable::from_configs(&configs),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_duplicate_joint() {
        let mut configs = DEFAULT_SERVOS;
        configs[1].axis = Axis::Horizontal;
        let err = ServoTable::from_configs(&configs).unwrap_err();
        assert!(err.to_string().contains("FL x"));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut configs = DEFAULT_SERVOS;
        configs[3].angle_min = 150.0;
        configs[3].angle_max = 40.0;
        assert!(ServoTable::from_configs(&configs).is_err());
    }

    #[test]
    fn rejects_short_table() {
        assert!(ServoTable::from_configs(&DEFAULT_SERVOS[..7]).is_err());
    }
}
