//! Gait engine and fixed-rate execution loop.
//!
//! `GaitEngine` owns the servo driver and the validated tables. `start`
//! borrows it for the lifetime of a `GaitRun`, which drives ticks at a
//! fixed rate until cancelled or out of steps. Whatever way a run ends
//! (cancel, step limit, explicit stop, drop) the engine commands every
//! servo to its neutral pose before returning to `Idle`.

use crate::diagnostics::{DiagnosticSink, GaitSample, TracingSink, is_sample_tick};
use crate::error::GaitError;
use crate::limiter::AngleLimiter;
use crate::mapper::ServoMapper;
use crate::output::{TickFlags, TickReport, command_servo};
use crate::phase::PhaseEngine;
use crate::state::{CancelHandle, EngineState, EngineStatus, ExitReason, RunParams};
use crate::trajectory::{JointAngles, evaluate};
use quad_common::config::{BusConfig, RobotConfig, TimingConfig, validate_period};
use quad_common::consts::{LEG_COUNT, SERVO_COUNT};
use quad_common::driver::ServoDriver;
use quad_common::gait::{GaitParams, GaitTable};
use quad_common::servo::ServoTable;
use quad_common::types::{Axis, GaitMode, Leg, ServoId};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Ticks between periodic timing summaries (10 s at the default rate).
const STATS_LOG_INTERVAL: u64 = 200;

/// Loop timing statistics.
#[derive(Debug, Default, Clone, Copy)]
struct TimingStats {
    /// Ticks executed
    tick_count: u64,
    /// Ticks that finished after their deadline
    overruns: u64,
    /// Longest observed tick
    max_tick_us: u64,
    /// Sum of tick times for average calculation
    total_tick_us: u64,
}

impl TimingStats {
    fn record(&mut self, tick: Duration) {
        let tick_us = tick.as_micros() as u64;
        self.tick_count += 1;
        self.total_tick_us += tick_us;
        if tick_us > self.max_tick_us {
            self.max_tick_us = tick_us;
        }
    }

    fn avg_tick_us(&self) -> u64 {
        if self.tick_count > 0 {
            self.total_tick_us / self.tick_count
        } else {
            0
        }
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Mode that was running.
    pub mode: GaitMode,
    /// Why the loop ended.
    pub reason: ExitReason,
    /// Ticks executed.
    pub steps: u64,
    /// Ticks with at least one clamped angle.
    pub clamped_ticks: u64,
    /// Failed writes during the gait (neutral pass excluded).
    pub failed_writes: u64,
    /// Failed writes during the neutral pass.
    pub neutral_failures: usize,
    /// Ticks that finished past their deadline.
    pub overruns: u64,
    /// Longest tick.
    pub max_tick: Duration,
    /// Wall time from `start` to the end of the neutral pass.
    pub wall_time: Duration,
}

/// Gait engine: driver, calibration and gait table.
pub struct GaitEngine {
    /// Servo bus driver
    driver: Box<dyn ServoDriver>,
    bus: BusConfig,
    timing: TimingConfig,
    servos: ServoTable,
    gaits: GaitTable,
    limiter: AngleLimiter,
    mapper: ServoMapper,
    /// Receives a sample every `diagnostic_stride` ticks
    sink: Box<dyn DiagnosticSink>,
    status: EngineStatus,
    /// Set by `initialize()`
    bus_ready: bool,
}

impl GaitEngine {
    /// Create an engine from a configuration and a driver instance.
    ///
    /// The driver is not touched until `initialize`.
    ///
    /// # Errors
    /// `GaitError::Config` if any section or derived table is invalid.
    pub fn new(config: &RobotConfig, driver: Box<dyn ServoDriver>) -> Result<Self, GaitError> {
        config.shared.validate()?;
        config.timing.validate()?;
        config.bus.validate()?;
        let servos = config.servo_table()?;
        let gaits = config.gait_table()?;

        info!(
            "GaitEngine created with '{}' driver v{}, dt={}s, cycle={}s, {} gait overrides",
            driver.name(),
            driver.version(),
            config.timing.dt,
            config.timing.cycle_duration,
            config.gaits.len()
        );

        Ok(Self {
            driver,
            bus: config.bus.clone(),
            timing: config.timing,
            limiter: AngleLimiter::new(&servos),
            mapper: ServoMapper::new(&servos),
            servos,
            gaits,
            sink: Box::new(TracingSink),
            status: EngineStatus::Idle,
            bus_ready: false,
        })
    }

    /// Replace the diagnostic sink.
    pub fn with_sink<S: DiagnosticSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Open the bus and configure every servo.
    ///
    /// A servo that fails to configure is logged and counted, not fatal.
    /// Returns the number of such servos.
    ///
    /// # Errors
    /// `GaitError::Driver` if the bus itself cannot be opened.
    pub fn initialize(&mut self) -> Result<usize, GaitError> {
        info!(
            "Initializing servo bus on {} via '{}' driver",
            self.bus.port,
            self.driver.name()
        );
        self.driver.init(&self.bus)?;

        let mut failed = 0;
        for id in ServoId::all() {
            if let Err(e) =
                self.driver
                    .initialize(id, self.bus.mode, self.bus.acceleration, self.bus.speed)
            {
                warn!("Servo {} initialization failed: {}", id, e);
                failed += 1;
            }
        }

        self.bus_ready = true;
        info!(
            "Servo bus ready: {}/{} servos configured (mode={:?}, acc={}, speed={})",
            SERVO_COUNT - failed,
            SERVO_COUNT,
            self.bus.mode,
            self.bus.acceleration,
            self.bus.speed
        );
        Ok(failed)
    }

    /// Read and log the supply voltage of every servo, in id order.
    pub fn read_voltages(&mut self) -> [Option<f64>; SERVO_COUNT] {
        let mut voltages = [None; SERVO_COUNT];
        for id in ServoId::all() {
            match self.driver.read_voltage(id) {
                Ok(v) => {
                    info!("Servo {} voltage: {:.2} V", id, v);
                    voltages[id.index()] = Some(v);
                }
                Err(e) => warn!("Servo {} voltage read failed: {}", id, e),
            }
        }
        voltages
    }

    /// Begin a gait.
    ///
    /// # Errors
    /// - `GaitError::NotInitialized` before `initialize`
    /// - `GaitError::InvalidTiming` for a `dt` or cycle duration that is
    ///   non-finite, non-positive or above `MAX_PERIOD`
    pub fn start(&mut self, mode: GaitMode, params: RunParams) -> Result<GaitRun<'_>, GaitError> {
        if !self.bus_ready {
            return Err(GaitError::NotInitialized);
        }

        let entry = *self.gaits.get(mode);
        let dt = params.dt.unwrap_or(self.timing.dt);
        validate_period("dt", dt).map_err(|e| GaitError::InvalidTiming(e.to_string()))?;
        let cycle_duration = params
            .cycle_duration
            .or(entry.cycle_duration)
            .unwrap_or(self.timing.cycle_duration);
        let phase = PhaseEngine::new(cycle_duration)?;
        let waveform = params.waveform.unwrap_or(entry.waveform);

        self.status = EngineStatus::Running;
        info!(
            "Starting {} ({} waveform, cycle={}s, dt={}s, steps={})",
            mode,
            waveform,
            cycle_duration,
            dt,
            params
                .max_steps
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
        );

        Ok(GaitRun {
            engine: self,
            params: entry,
            phase,
            state: EngineState {
                step: 0,
                mode,
                cycle_duration,
                dt,
                waveform,
            },
            max_steps: params.max_steps,
            cancel: CancelHandle::new(),
            stats: TimingStats::default(),
            clamped_ticks: 0,
            failed_writes: 0,
            started: Instant::now(),
            finished: false,
        })
    }

    /// Command every servo to its neutral pose in id order, then wait
    /// `settle_time`.
    pub fn move_to_neutral(&mut self) -> TickReport {
        let mut report = TickReport::new(0);
        for cfg in self.servos.iter() {
            report.push(command_servo(
                &self.limiter,
                &self.mapper,
                self.driver.as_mut(),
                cfg.id,
                cfg.neutral,
            ));
        }
        report.log("neutral");

        if let Ok(settle) = Duration::try_from_secs_f64(self.timing.settle_time) {
            std::thread::sleep(settle);
        }
        info!(
            "Neutral pose commanded ({} of {} servos)",
            SERVO_COUNT - report.failed_writes(),
            SERVO_COUNT
        );
        report
    }

    /// Release the bus.
    pub fn shutdown(&mut self) -> Result<(), GaitError> {
        if let Some(diag) = self.driver.diagnostics() {
            debug!(
                "Driver diagnostics: {} writes, {} failed{}",
                diag.writes,
                diag.failed_writes,
                diag.custom.map(|c| format!(" [{c}]")).unwrap_or_default()
            );
        }
        self.driver.shutdown()?;
        self.bus_ready = false;
        info!("Servo bus released");
        Ok(())
    }

    /// Current lifecycle status.
    pub fn status(&self) -> EngineStatus {
        self.status
    }

    /// Whether the bus is open and servos configured.
    pub fn is_initialized(&self) -> bool {
        self.bus_ready
    }

    /// Gait table with overrides applied.
    pub fn gaits(&self) -> &GaitTable {
        &self.gaits
    }

    /// Servo calibration.
    pub fn servos(&self) -> &ServoTable {
        &self.servos
    }

    /// Configured timing defaults.
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// The servo bus driver.
    pub fn driver(&self) -> &dyn ServoDriver {
        self.driver.as_ref()
    }
}

/// An active gait. Holds the engine exclusively until finished.
///
/// Dropping an unfinished run still returns the robot to neutral.
pub struct GaitRun<'a> {
    engine: &'a mut GaitEngine,
    /// Table entry of the running mode
    params: GaitParams,
    phase: PhaseEngine,
    state: EngineState,
    max_steps: Option<u64>,
    cancel: CancelHandle,
    stats: TimingStats,
    clamped_ticks: u64,
    failed_writes: u64,
    started: Instant,
    finished: bool,
}

impl GaitRun<'_> {
    /// Handle that cancels this run after the current tick.
    pub fn handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Status of the engine held by this run.
    pub fn status(&self) -> EngineStatus {
        self.engine.status
    }

    /// Leg angles at gait time `t`, before limiting.
    pub fn angles_at(&self, t: f64) -> [JointAngles; LEG_COUNT] {
        let phases = self.phase.leg_phases(t, &self.params.phase_offset);
        Leg::ALL.map(|leg| evaluate(self.state.waveform, &self.params.leg(leg), phases[leg.index()]))
    }

    /// Execute one tick immediately (no pacing).
    pub fn tick(&mut self) -> TickReport {
        let step = self.state.step;
        let t = self.state.elapsed();
        let legs = self.angles_at(t);

        let engine = &mut *self.engine;
        let mut report = TickReport::new(step);
        for leg in Leg::ALL {
            for axis in Axis::ALL {
                let id = engine.mapper.leg_axis_to_id(leg, axis);
                report.push(command_servo(
                    &engine.limiter,
                    &engine.mapper,
                    engine.driver.as_mut(),
                    id,
                    legs[leg.index()].get(axis),
                ));
            }
        }
        report.log(self.state.mode.as_str());

        if report.flags().contains(TickFlags::CLAMPED) {
            self.clamped_ticks += 1;
        }
        self.failed_writes += report.failed_writes() as u64;

        if is_sample_tick(step, engine.timing.diagnostic_stride) {
            engine.sink.record(&GaitSample {
                step,
                elapsed: t,
                phase: self.phase.global(t),
                mode: self.state.mode,
                legs,
            });
        }

        self.state.step += 1;
        report
    }

    /// Drive ticks at a fixed rate until cancelled or `max_steps` is
    /// reached, then return to neutral.
    pub fn run(mut self) -> RunSummary {
        let dt = self.state.dt;
        let origin = Instant::now();

        let reason = loop {
            if self.cancel.is_cancelled() {
                break ExitReason::Cancelled;
            }
            if self.max_steps.is_some_and(|max| self.state.step >= max) {
                break ExitReason::StepLimit;
            }

            let tick_start = Instant::now();
            self.tick();
            self.stats.record(tick_start.elapsed());

            // Deadlines are absolute so sleep jitter does not accumulate
            let deadline = Duration::try_from_secs_f64(self.state.step as f64 * dt)
                .ok()
                .and_then(|offset| origin.checked_add(offset));
            let Some(deadline) = deadline else {
                warn!("Tick deadline for step {} is unrepresentable, not pacing", self.state.step);
                continue;
            };
            let now = Instant::now();
            if now < deadline {
                std::thread::sleep(deadline - now);
            } else {
                self.stats.overruns += 1;
                if self.stats.overruns <= 10 || self.stats.overruns % 1000 == 0 {
                    warn!(
                        "Tick overrun #{}: step {} finished {}us past its deadline (dt={}s)",
                        self.stats.overruns,
                        self.state.step - 1,
                        (now - deadline).as_micros(),
                        dt
                    );
                }
            }

            if self.stats.tick_count % STATS_LOG_INTERVAL == 0 {
                debug!(
                    "Gait loop: {} ticks, avg={}us, max={}us, overruns={}",
                    self.stats.tick_count,
                    self.stats.avg_tick_us(),
                    self.stats.max_tick_us,
                    self.stats.overruns
                );
            }
        };

        self.finish(reason)
    }

    /// End the run now and return to neutral.
    pub fn stop(mut self) -> RunSummary {
        self.finish(ExitReason::Stopped)
    }

    fn finish(&mut self, reason: ExitReason) -> RunSummary {
        if reason == ExitReason::Cancelled {
            self.engine.status = EngineStatus::Cancelling;
            info!(
                "Cancellation observed after step {}, returning to neutral",
                self.state.step
            );
        }

        let neutral = self.engine.move_to_neutral();
        self.engine.status = EngineStatus::Idle;
        self.finished = true;

        let summary = RunSummary {
            mode: self.state.mode,
            reason,
            steps: self.state.step,
            clamped_ticks: self.clamped_ticks,
            failed_writes: self.failed_writes,
            neutral_failures: neutral.failed_writes(),
            overruns: self.stats.overruns,
            max_tick: Duration::from_micros(self.stats.max_tick_us),
            wall_time: self.started.elapsed(),
        };

        debug!(
            "Gait loop stopped after {} ticks (avg={}us, max={}us, overruns={})",
            self.stats.tick_count,
            self.stats.avg_tick_us(),
            self.stats.max_tick_us,
            self.stats.overruns
        );
        info!(
            "Gait execution completed: {} {} after {} steps ({} clamped ticks, {} failed writes)",
            summary.mode, summary.reason, summary.steps, summary.clamped_ticks, summary.failed_writes
        );
        summary
    }
}

// Also runs while unwinding from a panic. The release profile sets
// `panic = "abort"`, so there a panic ends the process without it.
impl Drop for GaitRun<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.finish(ExitReason::Dropped);
        }
    }
}
