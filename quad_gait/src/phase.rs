//! Cycle phase computation.
//!
//! The global phase is the position within the current gait cycle:
//! `(t / cycle_duration) mod 1`. Each leg runs at the global phase shifted
//! by its offset, again wrapped into `[0, 1)`.

use crate::error::GaitError;
use quad_common::config::validate_period;
use quad_common::consts::LEG_COUNT;

/// Wrap `value` into `[0, 1)`.
#[inline]
fn wrap_unit(value: f64) -> f64 {
    let wrapped = value.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Global phase at time `t` [s].
#[inline]
pub fn global_phase(t: f64, cycle_duration: f64) -> f64 {
    wrap_unit(t / cycle_duration)
}

/// Phase of a leg shifted by `offset`.
#[inline]
pub fn leg_phase(global: f64, offset: f64) -> f64 {
    wrap_unit(global + offset)
}

/// Phase source for a run with a fixed cycle duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseEngine {
    cycle_duration: f64,
}

impl PhaseEngine {
    /// # Errors
    /// `GaitError::InvalidTiming` unless `cycle_duration` is finite and > 0.
    pub fn new(cycle_duration: f64) -> Result<Self, GaitError> {
        validate_period("cycle_duration", cycle_duration)
            .map_err(|e| GaitError::InvalidTiming(e.to_string()))?;
        Ok(Self { cycle_duration })
    }

    /// Cycle duration [s].
    pub fn cycle_duration(&self) -> f64 {
        self.cycle_duration
    }

    /// Global phase at time `t`.
    #[inline]
    pub fn global(&self, t: f64) -> f64 {
        global_phase(t, self.cycle_duration)
    }

    /// Phase of every leg at time `t`, indexed by `Leg::index()`.
    pub fn leg_phases(&self, t: f64, offsets: &[f64; LEG_COUNT]) -> [f64; LEG_COUNT] {
        let p = self.global(t);
        offsets.map(|offset| leg_phase(p, offset))
    }
}
