//! # Sluice Control Unit
//!
//! Supervisory tick loop for water gates.
//!
//! Loads a site catalog (`--config`, else `config/sluice.toml` when it
//! exists, else a built-in demo site), seeds any
//! missing starting openings, logs in a demo operator with the selected
//! role and operating mode and then runs fixed-interval ticks against the
//! hydrology simulator until `--ticks` is reached or Ctrl-C.
//!
//! The console touches the session every tick unless `--unattended` is
//! given, in which case the idle logout applies between ticks.

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sluice_common::config::{ConfigLoader, LogLevel};
use sluice_common::consts::DEFAULT_CONFIG_PATH;
use sluice_common::gate::config::SluiceConfig;
use sluice_common::gate::key::GateHouseKey;
use sluice_common::gate::state::{GeneratorState, OperatingMode, Role};
use sluice_control_unit::config::validate_config;
use sluice_control_unit::control::program::ProgramSource;
use sluice_control_unit::cycle::Supervisor;
use sluice_control_unit::state::gate::Gate;
use sluice_control_unit::state::session::ControlSession;
use sluice_sim::hydrology::{HydrologyParams, HydrologySimulator, gate_flow};
use sluice_sim::noise::RandomNoise;
use sluice_sim::seed::{demo_config, seed_openings};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Sluice Control Unit: supervisory gate control loop
#[derive(Parser, Debug)]
#[command(name = "sluice_control_unit")]
#[command(version)]
#[command(about = "Supervisory tick loop for sluice gates with simulated hydrology")]
struct Args {
    /// Site configuration TOML. Defaults to `config/sluice.toml`, then the demo site.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stop after this many ticks (default: run until Ctrl-C).
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the configured tick interval [ms].
    #[arg(long)]
    interval_ms: Option<u64>,

    /// RNG seed for starting openings and measurement noise.
    #[arg(long)]
    seed: Option<u64>,

    /// Operating mode of the demo operator (local, manual, auto, program).
    #[arg(long, default_value = "auto")]
    mode: OperatingMode,

    /// Role of the demo operator (admin, operator, viewer).
    #[arg(long, default_value = "operator")]
    role: Role,

    /// Do not count the console as operator activity.
    #[arg(long)]
    unattended: bool,

    /// Pattern id run in program mode.
    #[arg(long, default_value = "p50")]
    program: String,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,

    /// Print a JSON cycle report to stdout after every tick.
    #[arg(long)]
    report: bool,
}

fn main() {
    let args = Args::parse();
    // Parsed before tracing so `[shared] log_level` can set the default level.
    let config_path = args.config.clone().or_else(|| {
        let fallback = Path::new(DEFAULT_CONFIG_PATH);
        fallback.exists().then(|| fallback.to_path_buf())
    });
    let raw = match &config_path {
        Some(path) => SluiceConfig::load(path),
        None => Ok(demo_config()),
    };
    let log_level = raw
        .as_ref()
        .map(|cfg| cfg.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("Sluice Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => warn!("No config file found, using the built-in demo site"),
    }

    let result = match raw {
        Ok(raw) => run(&args, raw),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Sluice Control Unit shutdown complete");
}

fn run(args: &Args, mut raw: SluiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let seeded = seed_openings(&mut raw, &mut rng);
    let loaded = validate_config(raw)?;
    info!(
        "Config OK: service={}, gates={} ({} seeded), patterns={}",
        loaded.shared.service_name,
        loaded.gate_count(),
        seeded,
        loaded.catalog.len()
    );

    let interval =
        Duration::from_millis(args.interval_ms.unwrap_or(loaded.control.tick_interval_ms));
    let mut supervisor = Supervisor::new(&loaded);
    let houses: Vec<GateHouseKey> = supervisor.gatehouse_keys().cloned().collect();

    let now = Instant::now();
    let mut session = ControlSession::new();
    session.mode = args.mode;
    session.remote_enabled = true;
    session.generator_state = GeneratorState::Running;
    session.login("demo", args.role, now);
    start_mode(&mut supervisor, &mut session, &houses, args, now)?;

    let noise = match args.seed {
        Some(seed) => RandomNoise::seeded(seed.wrapping_add(1)),
        None => RandomNoise::from_entropy(),
    };
    let mut hydrology =
        HydrologySimulator::new(loaded.hydraulics, HydrologyParams::default(), noise);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    info!("Entering tick loop (interval={}ms, mode={})", interval.as_millis(), args.mode);
    let mut ticks = 0u64;
    while running.load(Ordering::SeqCst) && args.ticks.is_none_or(|limit| ticks < limit) {
        let now = Instant::now();
        for key in &houses {
            let Some(house) = supervisor.gatehouse(key) else {
                continue;
            };
            let q_gates = gate_flow(mean_opening(&supervisor, key), house.q_full_open());
            let reading = hydrology.step(house.reading(), q_gates);
            supervisor.record_reading(key, reading)?;
        }

        if !args.unattended {
            session.touch(now);
        }
        if supervisor.expire_idle(&mut session, now) {
            warn!("Demo operator logged out after {}s idle", loaded.control.idle_timeout_s);
        }
        let report = supervisor.advance(&mut session, now);
        if args.report {
            println!("{}", serde_json::to_string(&report)?);
        }
        for house in report.gatehouses.iter().filter(|h| h.alarm_active) {
            warn!(
                "{}: alarm active: {}",
                house.key,
                house.alarm_message.as_deref().unwrap_or("-")
            );
        }

        ticks += 1;
        std::thread::sleep(interval);
    }

    let stats = supervisor.stats();
    info!(
        "Ran {} ticks: forced_stops={}, alarms_fired={}, drives_completed={}",
        stats.tick_count, stats.forced_stops, stats.alarms_fired, stats.drives_completed
    );
    Ok(())
}

/// Start the controllers the selected mode runs on its own.
fn start_mode(
    supervisor: &mut Supervisor,
    session: &mut ControlSession,
    houses: &[GateHouseKey],
    args: &Args,
    now: Instant,
) -> Result<(), Box<dyn std::error::Error>> {
    match args.mode {
        OperatingMode::RemoteAutomatic => {
            for key in houses {
                let outcome = supervisor.start_automatic(session, key, now)?;
                info!("{key}: automatic start → {outcome:?}");
            }
        }
        OperatingMode::RemoteProgram => {
            for key in houses {
                supervisor.select_program(key, ProgramSource::Pattern(args.program.clone()))?;
                let outcome = supervisor.run_program(session, key, now)?;
                info!("{key}: program '{}' → {outcome:?}", args.program);
            }
        }
        OperatingMode::RemoteManual => {
            info!("Manual mode: gates hold until commanded");
        }
        OperatingMode::Local => {
            info!("Local mode: all outputs blocked");
        }
    }
    Ok(())
}

fn mean_opening(supervisor: &Supervisor, key: &GateHouseKey) -> f64 {
    let (sum, count) = supervisor
        .gates()
        .filter(|g| g.key().belongs_to(key))
        .map(Gate::opening)
        .fold((0.0, 0usize), |(sum, n), pct| (sum + pct, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
///
/// Logs go to stderr so `--report` output on stdout stays machine-readable.
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
