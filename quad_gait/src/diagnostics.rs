//! Periodic gait diagnostics.
//!
//! Every `diagnostic_stride` ticks the engine hands a `GaitSample` to its
//! `DiagnosticSink`. The default sink logs through `tracing`; tests and
//! tools can collect samples in memory or over a channel instead.

use crate::trajectory::JointAngles;
use quad_common::consts::LEG_COUNT;
use quad_common::types::{GaitMode, Leg};
use std::fmt;
use std::sync::mpsc::Sender;
use tracing::info;

/// Snapshot of the commanded (pre-clamp) leg angles at one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct GaitSample {
    /// Tick index.
    pub step: u64,
    /// Gait time `step * dt` [s].
    pub elapsed: f64,
    /// Global phase in [0, 1).
    pub phase: f64,
    pub mode: GaitMode,
    /// Indexed by `Leg::index()`.
    pub legs: [JointAngles; LEG_COUNT],
}

impl fmt::Display for GaitSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} t={:.2}s phase={:.3} {}",
            self.step, self.elapsed, self.phase, self.mode
        )?;
        for leg in Leg::ALL {
            let angles = self.legs[leg.index()];
            write!(f, " | {}: x={:.1} z={:.1}", leg.abbrev(), angles.x, angles.z)?;
        }
        Ok(())
    }
}

/// Consumer of periodic samples.
pub trait DiagnosticSink: Send {
    fn record(&mut self, sample: &GaitSample);
}

/// Logs samples at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&mut self, sample: &GaitSample) {
        info!(target: "quad_gait::diagnostics", "{}", sample);
    }
}

impl DiagnosticSink for Vec<GaitSample> {
    fn record(&mut self, sample: &GaitSample) {
        self.push(sample.clone());
    }
}

impl DiagnosticSink for Sender<GaitSample> {
    fn record(&mut self, sample: &GaitSample) {
        // Receiver gone means nobody is listening any more
        let _ = self.send(sample.clone());
    }
}

/// Whether tick `step` is due for a sample.
#[inline]
pub fn is_sample_tick(step: u64, stride: u32) -> bool {
    stride > 0 && step % u64::from(stride) == 0
}
