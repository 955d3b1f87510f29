//! # Lens Control Core
//!
//! Runs the control core against the simulation board for a fixed span of
//! simulated time, optionally feeding it bus commands, then prints a JSON
//! report of the final state.
//!
//! ```text
//! lens_control --config config/lens.toml --duration-ms 3000 \
//!     --command 0x3202 --command 0x1001 --status-request
//! ```

use clap::Parser;
use lens_common::config::{ConfigError, LogLevel};
use lens_common::control::config::LensConfig;
use lens_common::control::types::Phase;
use lens_control::config::load_config;
use lens_control::cycle::{ControlSnapshot, StepTiming};
use lens_control::sim::{SimController, load_sim_params};
use lens_sim::{SentFrame, SimBoard, SimParams};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Lens Control Core: actuator control against the simulation board
#[derive(Parser, Debug)]
#[command(name = "lens_control")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Bus-commanded focus and rotary selector control, simulated")]
struct Args {
    /// Path to the controller configuration TOML. Defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to simulation board parameters TOML.
    #[arg(long, value_name = "FILE")]
    sim_config: Option<PathBuf>,

    /// Simulated run time [ms].
    #[arg(long, default_value_t = 5_000)]
    duration_ms: u64,

    /// Simulated time per controller step [µs].
    #[arg(long, default_value_t = 100)]
    tick_us: u64,

    /// Command payload (data_low, hex) to send once running. Repeatable.
    #[arg(long = "command", value_name = "HEX", value_parser = parse_hex)]
    commands: Vec<u32>,

    /// Spacing between queued commands [ms].
    #[arg(long, default_value_t = 1_500)]
    command_interval_ms: u64,

    /// Send a status request at the end of the run.
    #[arg(long)]
    status_request: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn parse_hex(text: &str) -> Result<u32, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid hex payload '{text}': {e}"))
}

/// Final run report.
#[derive(Debug, Serialize)]
struct Report {
    simulated_ms: u64,
    focus_position_raw: u32,
    mechanical_phase: Option<Phase>,
    rotary_travel: (f64, f64),
    bus_status: u8,
    sampler_status: u8,
    sequencer_status: u8,
    step_timing: StepTiming,
    status_frames: Vec<SentFrame>,
    controller: ControlSnapshot,
}

fn main() {
    let args = Args::parse();
    // Loaded ahead of the subscriber so its log level applies.
    let config = args.config.as_deref().map(load_config).transpose();
    let configured = match config {
        Ok(Some(ref c)) => c.shared.log_level,
        _ => LogLevel::default(),
    };
    setup_tracing(&args, configured);

    info!("Lens Control Core v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Lens Control Core shutdown complete");
}

fn run(
    args: &Args,
    config: Result<Option<LensConfig>, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.tick_us == 0 {
        return Err("--tick-us must be greater than 0".into());
    }

    let config = match config? {
        Some(config) => config,
        None => {
            warn!("No --config given, using defaults");
            LensConfig::default()
        }
    };
    info!(
        "Service '{}', focus limit {}, settle {} ms ({:?})",
        config.shared.service_name,
        config.focus.max_target,
        config.sequencer.settle_ms,
        config.sequencer.settle_policy
    );
    let params = match args.sim_config {
        Some(ref path) => load_sim_params(path)?,
        None => SimParams::default(),
    };

    let (mut board, peripherals) = SimBoard::new(params);
    let mut controller = SimController::new(config, peripherals.into())?;
    controller.init()?;
    controller.start()?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let end_us = args.duration_ms.saturating_mul(1000);
    let interval_us = args.command_interval_ms.saturating_mul(1000);
    let mut commands = args.commands.iter().copied();
    let mut next_command_us = interval_us;
    let mut timing = StepTiming::new();

    while running.load(Ordering::SeqCst) && board.now_us() < end_us {
        board.advance(args.tick_us);

        if board.now_us() >= next_command_us {
            if let Some(data_low) = commands.next() {
                if board.send_command(data_low) {
                    info!("Command {data_low:#010x} sent at {} ms", board.now_us() / 1000);
                } else {
                    warn!("Command {data_low:#010x} not accepted by the bus");
                }
            }
            next_command_us = next_command_us.saturating_add(interval_us.max(args.tick_us));
        }

        let started = Instant::now();
        controller.step();
        timing.record(started.elapsed().as_nanos() as u64);
    }

    if !running.load(Ordering::SeqCst) {
        warn!("Run interrupted at {} ms", board.now_us() / 1000);
    }

    if args.status_request {
        board.request_status();
        controller.step();
    }

    let report = Report {
        simulated_ms: board.now_us() / 1000,
        focus_position_raw: board.focus_position_raw(),
        mechanical_phase: board.mechanical_phase(),
        rotary_travel: board.rotary_travel(),
        bus_status: controller.bus_status().bits(),
        sampler_status: controller.sampler_status().bits(),
        sequencer_status: controller.sequencer_status().bits(),
        step_timing: timing,
        status_frames: board.take_sent_frames(),
        controller: controller.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Level for the subscriber: `-v` forces DEBUG, otherwise the configured level.
fn effective_level(verbose: bool, configured: LogLevel) -> Level {
    let directive = if verbose {
        LogLevel::Debug.as_directive()
    } else {
        configured.as_directive()
    };
    directive.parse().unwrap_or(Level::INFO)
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = effective_level(args.verbose, configured);

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}
