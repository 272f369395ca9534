//! Multicore machine simulator CLI.
//!
//! This binary provides a single entry point for the simulation driver. It performs:
//! 1. **Run:** Load a JSON configuration (or defaults), assemble the named
//!    machine template, and drive the cycle engine to completion.
//! 2. **List:** Print every registered machine template, core, controller, and
//!    interconnect type.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::{fs, process};

use mcsim_core::sim::CycleEngine;
use mcsim_core::{Machine, SimConfig, assemble, register_builtins, registry};

#[derive(Parser, Debug)]
#[command(
    name = "mcsim",
    author,
    version,
    about = "Cycle-accurate multicore machine simulator",
    long_about = "Assemble a machine from a registered template and run the cycle engine.\n\nConfiguration is JSON (see SimConfig); flags override individual settings.\n\nExamples:\n  mcsim run --machine dual_core --stop-at 1000000\n  mcsim run --config sim.json --threaded\n  mcsim list"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble a machine and run the simulation.
    Run {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Machine template name (overrides machine_config).
        #[arg(short, long)]
        machine: Option<String>,

        /// Committed-instruction budget (overrides stop_at_user_insns).
        #[arg(long)]
        stop_at: Option<u64>,

        /// Request threaded simulation.
        #[arg(long)]
        threaded: bool,

        /// Cores per worker thread (overrides cores_per_worker).
        #[arg(long)]
        cores_per_worker: Option<usize>,

        /// Dump the assembled machine state after the run.
        #[arg(long)]
        dump_state: bool,
    },

    /// List registered templates and component types.
    List,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    register_builtins();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            machine,
            stop_at,
            threaded,
            cores_per_worker,
            dump_state,
        } => cmd_run(config, machine, stop_at, threaded, cores_per_worker, dump_state),
        Commands::List => cmd_list(),
    }
}

/// Loads configuration, applies flag overrides, assembles the machine, and
/// runs the engine. Configuration errors abort with a diagnostic.
fn cmd_run(
    config_path: Option<PathBuf>,
    machine: Option<String>,
    stop_at: Option<u64>,
    threaded: bool,
    cores_per_worker: Option<usize>,
    dump_state: bool,
) {
    let mut config = config_path.map_or_else(SimConfig::default, load_config);
    if let Some(machine) = machine {
        config.general.machine_config = machine;
    }
    if let Some(stop_at) = stop_at {
        config.run.stop_at_user_insns = stop_at;
    }
    if threaded {
        config.threading.threaded_simulation = true;
    }
    if let Some(cores_per_worker) = cores_per_worker {
        config.threading.cores_per_worker = cores_per_worker;
    }
    if let Err(err) = config.validate() {
        fatal(&err.to_string());
    }

    let template = config.general.machine_config.clone();
    let mut machine = Machine::new(template.clone());
    if let Err(err) = assemble(&mut machine, &template, &config) {
        fatal(&err.to_string());
    }

    let mut engine = CycleEngine::new(machine, config);
    let report = engine.run();
    eprintln!();
    println!(
        "simulation stopped: {} after {} cycles",
        report.reason, report.cycles
    );
    engine.stats().print();

    if dump_state {
        let mut out = std::io::stdout().lock();
        if let Err(err) = engine.machine().dump_state(&mut out) {
            tracing::warn!(%err, "state dump failed");
        }
    }
}

/// Prints every registered key, one registry per section.
fn cmd_list() {
    println!("machine templates:");
    for key in registry::machine_templates().keys() {
        println!("  {key}");
    }
    println!("core types:");
    for key in registry::core_types().keys() {
        println!("  {key}");
    }
    println!("controller types:");
    for key in registry::controller_types().keys() {
        println!("  {key}");
    }
    println!("interconnect types:");
    for key in registry::interconnect_types().keys() {
        println!("  {key}");
    }
}

/// Reads and parses a JSON configuration file. Exits with a diagnostic on
/// read or parse failure.
fn load_config(path: PathBuf) -> SimConfig {
    let text = fs::read_to_string(&path).unwrap_or_else(|err| {
        fatal(&format!("could not read config '{}': {err}", path.display()));
    });
    serde_json::from_str(&text).unwrap_or_else(|err| {
        fatal(&format!("could not parse config '{}': {err}", path.display()));
    })
}

fn fatal(msg: &str) -> ! {
    eprintln!("\n[!] FATAL: {msg}");
    process::exit(1);
}
