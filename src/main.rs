use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use proc_model::core::{ProcessState, Report, SimEvent, Snapshot};
use proc_model::sim::{RandomParams, Sim, parse_workload, random_workload};

/// Simulate processes contending for a core pool, one SSD and a TTY.
#[derive(Debug, Parser)]
#[command(name = "proc_model")]
struct Cli {
    /// Input file (NCORES / START / PID / CORE / SSD / TTY / END tokens).
    /// Reads stdin when absent.
    input: Option<PathBuf>,

    /// Print only the final report.
    #[arg(short, long)]
    quiet: bool,

    /// Raise log verbosity (repeatable). RUST_LOG overrides it.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Run a generated workload with this many processes instead of reading input.
    #[arg(long, value_name = "N")]
    random: Option<usize>,

    /// Seed for --random.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Core pool size for --random.
    #[arg(long, default_value_t = 2)]
    cores: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let workload = match cli.random {
        Some(processes) => {
            let params = RandomParams {
                processes,
                max_cores: cli.cores,
                ..Default::default()
            };
            random_workload(&params, cli.seed)
        }
        None => {
            let text = match &cli.input {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    std::io::stdin()
                        .read_to_string(&mut text)
                        .context("Failed to read stdin")?;
                    text
                }
            };
            parse_workload(&text)?
        }
    };

    if workload.processes.is_empty() {
        println!("No processes to simulate.");
        return Ok(());
    }

    let mut sim = Sim::new(workload)?;
    while !sim.all_processes_completed() {
        for event in sim.step() {
            render(&event, cli.quiet);
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn render(event: &SimEvent, quiet: bool) {
    match event {
        SimEvent::Finished(report) => print_report(report),
        _ if quiet => {}
        SimEvent::Admitted { pid, time, .. } => {
            println!("\nPID: {pid} Started at: {time} ms");
        }
        SimEvent::Snapshot(snapshot) => print_snapshot(snapshot),
        SimEvent::Terminated { pid, time } => {
            println!("\nProcess: {pid} terminated at time: {time} ms");
        }
        SimEvent::TerminationNotice { pid } => {
            println!("PID: {pid} , STATE: {}", ProcessState::Terminated);
        }
        SimEvent::Granted { .. } | SimEvent::SsdWait { .. } | SimEvent::Released { .. } => {}
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("Process Table:");
    for entry in &snapshot.entries {
        println!("PID: {} , STATE: {}", entry.pid, entry.state);
    }
}

fn print_report(report: &Report) {
    println!("\nREPORT:");
    println!("Simulated Time: {} ms", report.simulated_time);
    println!("SSD ACCESSES: {}", report.ssd_accesses);
    println!("Completed Processes: {}", report.completed_processes);
    println!("Average number of busy cores: {:.3}", report.average_busy_cores);
    println!("SSD utilization: {:.3}", report.ssd_utilization);
    println!("Average turnaround: {:.2} ms", report.mean_turnaround);
}
