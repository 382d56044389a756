//! Per-servo angle limiting.

use quad_common::consts::SERVO_COUNT;
use quad_common::servo::{AngleRange, ServoTable};
use quad_common::types::ServoId;

/// Result of limiting one requested angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limited {
    /// Angle to command [deg], always within the servo's range.
    pub angle: f64,
    /// Whether `angle` differs from the request.
    pub was_clamped: bool,
}

/// Clamp `requested` into `range`.
///
/// A non-finite request is replaced by `range.min` and flagged.
#[inline]
pub fn clamp_to_range(range: AngleRange, requested: f64) -> Limited {
    if requested.is_nan() {
        return Limited {
            angle: range.min,
            was_clamped: true,
        };
    }
    let angle = requested.clamp(range.min, range.max);
    Limited {
        angle,
        was_clamped: angle != requested,
    }
}

/// Angle ranges of all servos.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleLimiter {
    ranges: [AngleRange; SERVO_COUNT],
}

impl AngleLimiter {
    /// Collect the range of every servo in `servos`.
    pub fn new(servos: &ServoTable) -> Self {
        let mut ranges = [AngleRange { min: 0.0, max: 0.0 }; SERVO_COUNT];
        for cfg in servos.iter() {
            ranges[cfg.id.index()] = cfg.range();
        }
        Self { ranges }
    }

    /// Range of servo `id`.
    #[inline]
    pub fn range(&self, id: ServoId) -> AngleRange {
        self.ranges[id.index()]
    }

    /// Clamp `requested` to the range of servo `id`.
    #[inline]
    pub fn clamp(&self, id: ServoId, requested: f64) -> Limited {
        clamp_to_range(self.range(id), requested)
    }
}
