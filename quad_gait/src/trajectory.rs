//! Joint-space trajectory waveforms.
//!
//! Each waveform maps `(amplitude_x, amplitude_z, offset_x, offset_z, phase)`
//! to `(z, x)` joint angles in degrees, with `phase ∈ [0, 1)`:
//!
//! - **creep**: lift for the first quarter (half-sine in z, quarter-sine
//!   reach in x), then a grounded linear return of x to its offset.
//! - **creep-eased**: same lift, cosine-eased return.
//! - **trot**: lift for the first half (full-sine in z, half-sine in x),
//!   then a grounded cosine return.
//!
//! All functions are pure.

use quad_common::gait::{LegParams, Waveform};
use quad_common::types::Axis;
use std::f64::consts::{FRAC_PI_2, PI};

/// End of the lift window of the creep waveforms.
const CREEP_LIFT_END: f64 = 0.25;

/// End of the lift window of the trot waveform.
const TROT_LIFT_END: f64 = 0.5;

/// Commanded angles of one leg [deg].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAngles {
    /// Vertical joint.
    pub z: f64,
    /// Horizontal joint.
    pub x: f64,
}

impl JointAngles {
    /// Angle of `axis`.
    #[inline]
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.z,
        }
    }
}

/// Shared lift window of both creep waveforms.
#[inline]
fn creep_lift(amplitude_x: f64, amplitude_z: f64, offset_x: f64, offset_z: f64, phase: f64) -> (f64, f64) {
    let s = phase / CREEP_LIFT_END;
    let z = offset_z + amplitude_z * (s * PI).sin();
    let x = offset_x + amplitude_x * (s * FRAC_PI_2).sin();
    (z, x)
}

/// Normalized position within the creep return window, in [0, 1).
#[inline]
fn creep_return_progress(phase: f64) -> f64 {
    (phase - CREEP_LIFT_END) / (1.0 - CREEP_LIFT_END)
}

/// Creep waveform with linear return. Returns `(z, x)`.
pub fn creep(amplitude_x: f64, amplitude_z: f64, offset_x: f64, offset_z: f64, phase: f64) -> (f64, f64) {
    if phase < CREEP_LIFT_END {
        creep_lift(amplitude_x, amplitude_z, offset_x, offset_z, phase)
    } else {
        let u = creep_return_progress(phase);
        (offset_z, offset_x + amplitude_x * (1.0 - u))
    }
}

/// Creep waveform with cosine-eased return. Returns `(z, x)`.
pub fn creep_eased(amplitude_x: f64, amplitude_z: f64, offset_x: f64, offset_z: f64, phase: f64) -> (f64, f64) {
    if phase < CREEP_LIFT_END {
        creep_lift(amplitude_x, amplitude_z, offset_x, offset_z, phase)
    } else {
        let u = creep_return_progress(phase);
        (offset_z, offset_x + amplitude_x * (u * FRAC_PI_2).cos())
    }
}

/// Trot waveform. Returns `(z, x)`.
pub fn trot(amplitude_x: f64, amplitude_z: f64, offset_x: f64, offset_z: f64, phase: f64) -> (f64, f64) {
    if phase < TROT_LIFT_END {
        let z = offset_z + amplitude_z * (phase * 2.0 * PI).sin();
        let x = offset_x + amplitude_x * (phase * PI).sin();
        (z, x)
    } else {
        (offset_z, offset_x + amplitude_x * ((phase - TROT_LIFT_END) * PI).cos())
    }
}

/// Evaluate `waveform` for one leg at its own phase.
pub fn evaluate(waveform: Waveform, leg: &LegParams, phase: f64) -> JointAngles {
    let f = match waveform {
        Waveform::Creep => creep,
        Waveform::CreepEased => creep_eased,
        Waveform::Trot => trot,
    };
    let (z, x) = f(leg.x_amplitude, leg.z_amplitude, leg.x_offset, leg.z_offset, phase);
    JointAngles { z, x }
}
