//! # Quadruped Gait Engine
//!
//! Turns a named gait mode into per-tick servo commands for an eight-servo
//! quadruped and drives them through a `ServoDriver` at a fixed rate.
//!
//! # Module Structure
//!
//! - [`trajectory`] - Waveforms mapping phase to joint angles
//! - [`phase`] - Global and per-leg cycle phase
//! - [`limiter`] - Per-servo angle clamping
//! - [`mapper`] - Joint to servo resolution, angle to trimmed unit
//! - [`output`] - Per-servo outcomes and per-tick reports
//! - [`diagnostics`] - Periodic samples and their sinks
//! - [`state`] - Lifecycle status, cancel handle, run parameters
//! - [`engine`] - `GaitEngine` and the execution loop
//!
//! # Pipeline
//!
//! ```text
//! t = step·dt ─► phase ─► trajectory ─► limiter ─► mapper ─► driver.write
//!                                                     │
//!                                         TickReport ◄┘ ─► diagnostics
//! ```

pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod limiter;
pub mod mapper;
pub mod output;
pub mod phase;
pub mod state;
pub mod trajectory;

pub use crate::engine::{GaitEngine, GaitRun, RunSummary};
pub use crate::error::GaitError;
pub use crate::state::{CancelHandle, EngineStatus, ExitReason, RunParams};
