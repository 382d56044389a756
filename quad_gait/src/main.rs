//! # Quadruped Gait Binary
//!
//! Loads the robot configuration, opens the servo bus and runs a gait until
//! Ctrl-C or a step limit.
//!
//! # Usage
//!
//! ```bash
//! # Walk forward with the simulation driver until Ctrl-C
//! quad_gait --config config/robot.toml walk --mode creep-forward
//!
//! # 200 trot ticks with a faster cycle, verbose logging
//! quad_gait -v walk --mode trot-left --cycle 1.0 --steps 200
//!
//! # Park every joint at its neutral angle
//! quad_gait --config config/robot.toml neutral
//!
//! # Show the gait table
//! quad_gait modes
//! ```

use clap::{Parser, Subcommand};
use quad_common::config::{ConfigError, LogLevel, RobotConfig};
use quad_common::consts::DEFAULT_CONFIG_PATH;
use quad_common::gait::Waveform;
use quad_common::types::GaitMode;
use quad_gait::{GaitEngine, RunParams};
use quad_hal::DriverRegistry;
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Quadruped gait engine
#[derive(Parser, Debug)]
#[command(name = "quad_gait")]
#[command(version)]
#[command(about = "Gait trajectory engine for an eight-servo quadruped")]
#[command(long_about = None)]
struct Args {
    /// Robot configuration file (built-in calibration if omitted and the
    /// default path does not exist)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Servo bus driver (overrides bus.driver)
    #[arg(short, long)]
    driver: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a gait until Ctrl-C or the step limit
    Walk {
        /// Gait mode, e.g. creep-forward or trot-left
        #[arg(short, long, value_parser = parse_mode)]
        mode: GaitMode,

        /// Cycle duration in seconds
        #[arg(long)]
        cycle: Option<f64>,

        /// Tick period in seconds
        #[arg(long)]
        dt: Option<f64>,

        /// Stop after this many ticks
        #[arg(long)]
        steps: Option<u64>,

        /// Waveform override: creep, creep-eased or trot
        #[arg(long, value_parser = parse_waveform)]
        waveform: Option<Waveform>,

        /// Log a diagnostic sample every N ticks
        #[arg(long)]
        stride: Option<u32>,
    },
    /// Move every servo to its neutral pose
    Neutral,
    /// List the gait modes
    Modes,
}

fn parse_mode(s: &str) -> Result<GaitMode, String> {
    s.parse().map_err(|e: ConfigError| e.to_string())
}

fn parse_waveform(s: &str) -> Result<Waveform, String> {
    s.parse().map_err(|e: ConfigError| e.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("quad_gait failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config first so its log level can seed the subscriber
    let config = load_config(args.config.as_deref());
    let level = match &config {
        Ok((config, _)) => config.shared.log_level,
        Err(_) => LogLevel::default(),
    };
    setup_tracing(&args, level);

    let (mut config, source) = config?;
    info!("quad_gait v{} starting...", env!("CARGO_PKG_VERSION"));
    match source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration at {}, using built-in calibration", DEFAULT_CONFIG_PATH),
    }

    if let Some(driver) = &args.driver {
        config.bus.driver = driver.clone();
    }

    match args.command {
        Command::Modes => {
            list_modes(&config)?;
        }
        Command::Neutral => {
            let mut engine = create_engine(&config)?;
            engine.initialize()?;
            engine.move_to_neutral();
            engine.shutdown()?;
        }
        Command::Walk {
            mode,
            cycle,
            dt,
            steps,
            waveform,
            stride,
        } => {
            if let Some(stride) = stride {
                config.timing.diagnostic_stride = stride;
            }
            let mut engine = create_engine(&config)?;
            engine.initialize()?;
            engine.read_voltages();

            let run = engine.start(
                mode,
                RunParams {
                    cycle_duration: cycle,
                    dt,
                    max_steps: steps,
                    waveform,
                },
            )?;

            let handle = run.handle();
            ctrlc::set_handler(move || {
                info!("Received shutdown signal");
                handle.cancel();
            })?;

            let summary = run.run();
            info!(
                "Run summary: {} steps, {} overruns, max tick {}us, wall {:.2}s",
                summary.steps,
                summary.overruns,
                summary.max_tick.as_micros(),
                summary.wall_time.as_secs_f64()
            );
            engine.shutdown()?;
        }
    }

    info!("quad_gait shutdown complete");
    Ok(())
}

/// Load the configuration. Returns the path it came from, or `None` when
/// the default path is absent and the built-in calibration is used.
fn load_config(path: Option<&Path>) -> Result<(RobotConfig, Option<PathBuf>), ConfigError> {
    match path {
        Some(path) => Ok((RobotConfig::from_file(path)?, Some(path.to_path_buf()))),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            match RobotConfig::from_file(default) {
                Ok(config) => Ok((config, Some(default.to_path_buf()))),
                Err(ConfigError::FileNotFound) => Ok((RobotConfig::default(), None)),
                Err(e) => Err(e),
            }
        }
    }
}

fn create_engine(config: &RobotConfig) -> Result<GaitEngine, Box<dyn std::error::Error>> {
    let driver = DriverRegistry::with_builtin()?.open(&config.bus)?;
    Ok(GaitEngine::new(config, driver)?)
}

fn list_modes(config: &RobotConfig) -> Result<(), ConfigError> {
    let gaits = config.gait_table()?;
    println!("{:<16} {:<12} {:>8}  phase offsets (FL FR RL RR)", "mode", "waveform", "cycle");
    for (mode, params) in gaits.iter() {
        let cycle = params.cycle_duration.unwrap_or(config.timing.cycle_duration);
        let offsets = params.phase_offset.map(|p| format!("{p:.2}")).join(" ");
        println!(
            "{:<16} {:<12} {:>7.2}s  {}",
            mode.as_str(),
            params.waveform.as_str(),
            cycle,
            offsets
        );
    }
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        match configured {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
