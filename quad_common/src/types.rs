//! Closed identifier types shared across the workspace.
//!
//! - `Leg` / `Axis` - the 4×2 joint space of the robot
//! - `ServoId` - bus address of one servo (1..=8)
//! - `GaitMode` - the eight named gait patterns
//! - `RawUnit` - servo-native position unit

use crate::config::ConfigError;
use crate::consts::{AXIS_COUNT, GAIT_MODE_COUNT, LEG_COUNT, SERVO_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Servo-native position unit (after angle conversion and trim).
pub type RawUnit = i32;

// ─── Leg ────────────────────────────────────────────────────────────

/// One of the four legs. Declaration order is the index order of every
/// per-leg array in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    /// Front-left.
    FrontLeft,
    /// Front-right.
    FrontRight,
    /// Rear-left.
    RearLeft,
    /// Rear-right.
    RearRight,
}

impl Leg {
    /// All legs in index order.
    pub const ALL: [Leg; LEG_COUNT] = [
        Leg::FrontLeft,
        Leg::FrontRight,
        Leg::RearLeft,
        Leg::RearRight,
    ];

    /// Index into per-leg arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The diagonally opposite leg (trot partner).
    pub const fn diagonal(self) -> Leg {
        match self {
            Leg::FrontLeft => Leg::RearRight,
            Leg::FrontRight => Leg::RearLeft,
            Leg::RearLeft => Leg::FrontRight,
            Leg::RearRight => Leg::FrontLeft,
        }
    }

    /// Two-letter tag used in log lines.
    pub const fn abbrev(self) -> &'static str {
        match self {
            Leg::FrontLeft => "FL",
            Leg::FrontRight => "FR",
            Leg::RearLeft => "RL",
            Leg::RearRight => "RR",
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

// ─── Axis ───────────────────────────────────────────────────────────

/// Joint axis of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Horizontal reach ("x").
    Horizontal,
    /// Vertical lift ("z").
    Vertical,
}

impl Axis {
    /// Both axes in index order.
    pub const ALL: [Axis; AXIS_COUNT] = [Axis::Horizontal, Axis::Vertical];

    /// Index into per-axis arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Horizontal => "x",
            Axis::Vertical => "z",
        })
    }
}

// ─── ServoId ────────────────────────────────────────────────────────

/// Bus address of a servo, guaranteed to lie in `1..=SERVO_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ServoId(u8);

impl ServoId {
    /// Lowest valid id.
    pub const MIN: u8 = 1;
    /// Highest valid id.
    pub const MAX: u8 = SERVO_COUNT as u8;

    /// Create an id, returning `None` if out of range.
    pub const fn new(raw: u8) -> Option<Self> {
        if raw >= Self::MIN && raw <= Self::MAX {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Caller guarantees `raw` is in range (compile-time tables only).
    pub(crate) const fn new_unchecked(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw bus address.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Index into per-servo arrays (id − 1).
    #[inline]
    pub const fn index(self) -> usize {
        (self.0 - Self::MIN) as usize
    }

    /// All ids in ascending order.
    pub fn all() -> impl Iterator<Item = ServoId> {
        (Self::MIN..=Self::MAX).map(ServoId)
    }
}

impl TryFrom<u8> for ServoId {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        ServoId::new(raw).ok_or_else(|| {
            format!(
                "servo id {} out of range [{}, {}]",
                raw,
                ServoId::MIN,
                ServoId::MAX
            )
        })
    }
}

impl From<ServoId> for u8 {
    fn from(id: ServoId) -> Self {
        id.0
    }
}

impl fmt::Display for ServoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── GaitMode ───────────────────────────────────────────────────────

/// Waveform family a gait mode belongs to. Determines the phase-offset
/// choreography the mode must follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaitFamily {
    /// One leg lifted at a time, quarter-cycle stagger.
    Creep,
    /// Diagonal leg pairs lifted together, half-cycle stagger.
    Trot,
}

/// Named gait pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GaitMode {
    /// Creep forward.
    CreepForward,
    /// Creep backward.
    CreepBackward,
    /// Creep sideways to the left.
    CreepLeft,
    /// Creep sideways to the right.
    CreepRight,
    /// Trot forward.
    TrotForward,
    /// Trot backward.
    TrotBackward,
    /// Trot sideways to the left.
    TrotLeft,
    /// Trot sideways to the right.
    TrotRight,
}

impl GaitMode {
    /// All modes in index order.
    pub const ALL: [GaitMode; GAIT_MODE_COUNT] = [
        GaitMode::CreepForward,
        GaitMode::CreepBackward,
        GaitMode::CreepLeft,
        GaitMode::CreepRight,
        GaitMode::TrotForward,
        GaitMode::TrotBackward,
        GaitMode::TrotLeft,
        GaitMode::TrotRight,
    ];

    /// Index into per-mode arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Family of this mode.
    pub const fn family(self) -> GaitFamily {
        match self {
            GaitMode::CreepForward
            | GaitMode::CreepBackward
            | GaitMode::CreepLeft
            | GaitMode::CreepRight => GaitFamily::Creep,
            GaitMode::TrotForward
            | GaitMode::TrotBackward
            | GaitMode::TrotLeft
            | GaitMode::TrotRight => GaitFamily::Trot,
        }
    }

    /// Canonical kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            GaitMode::CreepForward => "creep-forward",
            GaitMode::CreepBackward => "creep-backward",
            GaitMode::CreepLeft => "creep-left",
            GaitMode::CreepRight => "creep-right",
            GaitMode::TrotForward => "trot-forward",
            GaitMode::TrotBackward => "trot-backward",
            GaitMode::TrotLeft => "trot-left",
            GaitMode::TrotRight => "trot-right",
        }
    }
}

impl fmt::Display for GaitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts kebab-case or snake_case names, case-insensitive.
impl FromStr for GaitMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        GaitMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownGaitMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leg_indices_follow_declaration_order() {
        for (idx, leg) in Leg::ALL.iter().enumerate() {
            assert_eq!(leg.index(), idx);
        }
    }

    #[test]
    fn diagonal_is_an_involution() {
        for leg in Leg::ALL {
            assert_ne!(leg.diagonal(), leg);
            assert_eq!(leg.diagonal().diagonal(), leg);
        }
    }

    #[test]
    fn servo_id_range() {
        assert!(ServoId::new(0).is_none());
        assert!(ServoId::new(9).is_none());
        let id = ServoId::new(8).unwrap();
        assert_eq!(id.get(), 8);
        assert_eq!(id.index(), 7);
        assert_eq!(ServoId::all().count(), SERVO_COUNT);
    }

    #[test]
    fn servo_id_rejects_out_of_range_in_toml() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            #[allow(dead_code)]
            id: ServoId,
        }
        assert!(toml::from_str::<Wrapper>("id = 3").is_ok());
        assert!(toml::from_str::<Wrapper>("id = 0").is_err());
        assert!(toml::from_str::<Wrapper>("id = 12").is_err());
    }

    #[test]
    fn gait_mode_parsing() {
        assert_eq!("creep-forward".parse::<GaitMode>().unwrap(), GaitMode::CreepForward);
        assert_eq!("TROT_LEFT".parse::<GaitMode>().unwrap(), GaitMode::TrotLeft);
        assert!(matches!(
            "gallop".parse::<GaitMode>(),
            Err(ConfigError::UnknownGaitMode(_))
        ));
        for mode in GaitMode::ALL {
            assert_eq!(mode.as_str().parse::<GaitMode>().unwrap(), mode);
        }
    }

    #[test]
    fn gait_mode_families() {
        let creeps = GaitMode::ALL
            .iter()
            .filter(|m| m.family() == GaitFamily::Creep)
            .count();
        assert_eq!(creeps, 4);
        assert_eq!(GaitMode::TrotRight.family(), GaitFamily::Trot);
    }
}
