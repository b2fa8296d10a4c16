//! AquaFlow simulator entry point: CLI wiring and config-driven engine construction.

use std::io;
use std::path::Path;
use std::process;

use anyhow::{Context, Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use aquaflow_sim::config::ScenarioConfig;
use aquaflow_sim::io::export::export_csv;
use aquaflow_sim::sensor::{ReplaySensor, Sensor};
use aquaflow_sim::sim::clock::{Clock, StopSignal};
use aquaflow_sim::sim::engine::Engine;
use aquaflow_sim::sim::summary::RunSummary;
use aquaflow_sim::sim::types::WateringMode;

/// Ticks run in batch mode when `--ticks` is not given.
const DEFAULT_TICKS: u64 = 60;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    mode_override: Option<WateringMode>,
    ticks: u64,
    replay: Option<String>,
    realtime: bool,
    telemetry_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
    #[cfg(feature = "tui")]
    tui: bool,
}

fn print_help() {
    eprintln!("aquaflow-sim: water tank, pump and billing simulator");
    eprintln!();
    eprintln!("Usage: aquaflow-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --ticks <u64>            Ticks to run in batch mode (default: {DEFAULT_TICKS})");
    eprintln!("  --mode <on|off|auto>     Override initial watering mode");
    eprintln!("  --replay <path>          Replay sensor readings from CSV");
    eprintln!("  --realtime               Pace batch ticks at the scenario tick period");
    eprintln!("  --telemetry-out <path>   Export snapshots to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Run live and serve the REST API");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    #[cfg(feature = "tui")]
    eprintln!("  --tui                    Run the live terminal dashboard");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the single_tank preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        mode_override: None,
        ticks: DEFAULT_TICKS,
        replay: None,
        realtime: false,
        telemetry_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
        #[cfg(feature = "tui")]
        tui: false,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || -> Result<String> {
            i += 1;
            args.get(i)
                .cloned()
                .with_context(|| format!("{flag} requires an argument"))
        };
        match flag {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => cli.scenario_path = Some(value()?),
            "--preset" => cli.preset = Some(value()?),
            "--seed" => {
                let raw = value()?;
                cli.seed_override = Some(
                    raw.parse()
                        .with_context(|| format!("--seed value \"{raw}\" is not a valid u64"))?,
                );
            }
            "--ticks" => {
                let raw = value()?;
                cli.ticks = raw
                    .parse()
                    .with_context(|| format!("--ticks value \"{raw}\" is not a valid u64"))?;
            }
            "--mode" => {
                let raw = value()?;
                cli.mode_override = Some(raw.parse().map_err(anyhow::Error::msg)?);
            }
            "--replay" => cli.replay = Some(value()?),
            "--realtime" => cli.realtime = true,
            "--telemetry-out" => cli.telemetry_out = Some(value()?),
            #[cfg(feature = "api")]
            "--serve" => cli.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                let raw = value()?;
                cli.port = raw
                    .parse()
                    .with_context(|| format!("--port value \"{raw}\" is not a valid u16"))?;
            }
            #[cfg(feature = "tui")]
            "--tui" => cli.tui = true,
            other => {
                print_help();
                bail!("unknown argument \"{other}\"");
            }
        }
        i += 1;
    }

    Ok(cli)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Loads, overrides and validates the scenario.
///
/// `--scenario` takes priority, then `--preset`, then the single_tank default.
fn load_scenario(cli: &CliArgs) -> Result<(ScenarioConfig, String)> {
    let (mut scenario, name) = if let Some(ref path) = cli.scenario_path {
        let cfg = ScenarioConfig::from_toml_file(Path::new(path))?;
        let name = Path::new(path)
            .file_stem()
            .map_or_else(|| path.clone(), |s| s.to_string_lossy().into_owned());
        (cfg, name)
    } else if let Some(ref name) = cli.preset {
        (ScenarioConfig::from_preset(name)?, name.clone())
    } else {
        (ScenarioConfig::single_tank(), "single_tank".to_string())
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(mode) = cli.mode_override {
        scenario.simulation.mode = mode;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        let report: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("invalid scenario \"{name}\":\n{}", report.join("\n"));
    }
    Ok((scenario, name))
}

/// Runs `cli.ticks` ticks, prints each snapshot and the summary, and exports CSV.
fn run_batch<S: Sensor>(mut engine: Engine<S>, cli: &CliArgs) -> Result<()> {
    let tick_minutes = engine.config().tick_minutes();
    let period = engine.config().tick_period();
    let mut snapshots = Vec::new();
    let mut on_tick = |_step: u64| {
        let snapshot = engine.tick();
        println!("{snapshot}");
        snapshots.push(snapshot);
    };

    let mut clock = Clock::new(cli.ticks);
    if cli.realtime {
        clock = clock.with_period(period);
        clock.run_paced(&StopSignal::new(), &mut on_tick);
    } else {
        clock.run(&mut on_tick);
    }

    let summary = RunSummary::from_snapshots(&snapshots, tick_minutes);
    println!("\n{summary}");

    if let Some(ref path) = cli.telemetry_out {
        export_csv(&snapshots, Path::new(path))
            .with_context(|| format!("failed to write CSV to \"{path}\""))?;
        info!(path = %path, rows = snapshots.len(), "telemetry written");
    }
    Ok(())
}

#[cfg(feature = "api")]
fn run_server<S: Sensor + Send + 'static>(engine: Engine<S>, port: u16) -> Result<()> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use aquaflow_sim::api::{self, AppState, driver};

    let period = engine.config().tick_period();
    let topology = engine.plant().topology();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;

    rt.block_on(async move {
        let handle = driver::spawn(engine, period);
        let state = Arc::new(AppState {
            client: handle.client(),
            topology,
        });
        let served = tokio::select! {
            result = api::serve(state, addr) => result.with_context(|| format!("API server on {addr} failed")),
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                Ok(())
            }
        };
        let engine = handle.stop().await?;
        println!("\n{}", engine.snapshot());
        served
    })
}

fn dispatch<S: Sensor + Send + 'static>(engine: Engine<S>, cli: &CliArgs) -> Result<()> {
    #[cfg(feature = "api")]
    if cli.serve {
        return run_server(engine, cli.port);
    }
    run_batch(engine, cli)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = parse_args()?;
    let (scenario, name) = load_scenario(&cli)?;
    info!(scenario = %name, seed = scenario.simulation.seed, "scenario loaded");

    #[cfg(feature = "tui")]
    if cli.tui {
        if cli.replay.is_some() {
            bail!("--replay cannot be combined with --tui");
        }
        let app = aquaflow_sim::tui::runtime::App::new(scenario, &name)?;
        return aquaflow_sim::tui::run(app).context("terminal UI failed");
    }

    match cli.replay {
        Some(ref path) => {
            let layout = scenario.plant()?.sensor_layout();
            let sensor = ReplaySensor::from_csv_path(Path::new(path), &layout)?;
            info!(path = %path, frames = sensor.len(), "replaying sensor readings");
            dispatch(scenario.engine_with(sensor)?, &cli)
        }
        None => dispatch(scenario.engine()?, &cli),
    }
}
