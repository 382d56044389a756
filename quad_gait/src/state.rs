//! Engine lifecycle state and run parameters.

use quad_common::gait::Waveform;
use quad_common::types::GaitMode;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle of the engine.
///
/// ```text
/// Idle --start--> Running --cancel--> Cancelling --neutral--> Idle
///                    \-----step limit / drop----> (neutral) --> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineStatus {
    #[default]
    Idle,
    Running,
    /// Cancel observed, neutral return in progress.
    Cancelling,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineStatus::Idle => "idle",
            EngineStatus::Running => "running",
            EngineStatus::Cancelling => "cancelling",
        };
        f.write_str(s)
    }
}

/// Progress of the active run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineState {
    /// Ticks executed so far.
    pub step: u64,
    pub mode: GaitMode,
    /// Effective cycle duration [s].
    pub cycle_duration: f64,
    /// Effective tick period [s].
    pub dt: f64,
    pub waveform: Waveform,
}

impl EngineState {
    /// Gait time of the next tick [s].
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.step as f64 * self.dt
    }
}

/// Cloneable cancellation flag, safe to trigger from a signal handler or
/// another thread. The running tick always completes first.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// A handle that is not yet cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-run overrides of the configured defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunParams {
    /// Cycle duration [s]; falls back to the mode's, then the timing default.
    pub cycle_duration: Option<f64>,
    /// Tick period [s]; falls back to the timing default.
    pub dt: Option<f64>,
    /// Stop after this many ticks; `None` runs until cancelled.
    pub max_steps: Option<u64>,
    /// Waveform; falls back to the mode's.
    pub waveform: Option<Waveform>,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Cancel handle triggered.
    Cancelled,
    /// `max_steps` reached.
    StepLimit,
    /// `GaitRun::stop` called.
    Stopped,
    /// Run dropped without being driven to completion.
    Dropped,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::Cancelled => "cancelled",
            ExitReason::StepLimit => "step limit reached",
            ExitReason::Stopped => "stopped",
            ExitReason::Dropped => "dropped",
        };
        f.write_str(s)
    }
}
