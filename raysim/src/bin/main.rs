//! Raymond simulator CLI.
//!
//! Fully non-interactive when `--nodes` and `--load` are given; otherwise
//! the missing parameters are prompted for on stdin. Deterministic when a
//! seed is supplied.
//!
//! # Example
//!
//! ```bash
//! # Reproducible 16-node run under heavy load, trace suppressed
//! raysim --nodes 16 --load high --seed 42 --quiet
//!
//! # Interactive setup, per-event trace on stdout
//! raysim
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use raysim::{NullEmitter, PrintEmitter, ScenarioBuilder, SimLoad, TraceEmitter, DEFAULT_REQUESTS};

/// Raymond tree-mutex simulator
///
/// Simulates N nodes contending for one token under a synthetic workload
/// and reports per-CS message and token-pass counts.
#[derive(Parser, Debug)]
#[command(name = "raysim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of nodes. Prompted for when omitted.
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    nodes: Option<u32>,

    /// Workload intensity: low, med, or high. Prompted for when omitted.
    #[arg(short, long)]
    load: Option<SimLoad>,

    /// Random seed for reproducible runs. When omitted, a random seed is
    /// used.
    #[arg(long)]
    seed: Option<u64>,

    /// Critical sections each node requests.
    #[arg(short, long, default_value_t = DEFAULT_REQUESTS)]
    requests: u64,

    /// Suppress the per-event trace on stdout.
    #[arg(short, long)]
    quiet: bool,

    /// Assert protocol invariants after every dispatched message.
    #[arg(long)]
    check_invariants: bool,

    /// File the summary block is appended to.
    #[arg(long, default_value = "simRaymondLog.txt")]
    log_file: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let (nodes, load) = match resolve_parameters(&args) {
        Ok(params) => params,
        Err(err) => {
            eprintln!("input error: {err}");
            return ExitCode::from(2);
        }
    };

    let seed = args.seed.unwrap_or_else(rand::random);

    info!(nodes, %load, seed, requests = args.requests, "starting simulation");

    let emitter: Box<dyn TraceEmitter> = if args.quiet {
        Box::new(NullEmitter)
    } else {
        Box::new(PrintEmitter)
    };

    let outcome = ScenarioBuilder::new(nodes, load)
        .with_seed(seed)
        .with_requests(args.requests)
        .with_emitter(emitter)
        .with_invariant_checks(args.check_invariants)
        .run();

    let result = match outcome {
        Ok(result) => result,
        Err(violation) => {
            eprintln!("fatal: {violation}");
            return ExitCode::from(3);
        }
    };

    print!("{}", result.summary());

    if let Err(err) = result.append_to_log(&args.log_file) {
        warn!(path = %args.log_file.display(), %err, "could not append to run log");
    }

    ExitCode::SUCCESS
}

/// Fill in the node count and load, prompting on stdin for whichever the
/// command line left out.
fn resolve_parameters(args: &Args) -> io::Result<(u32, SimLoad)> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let nodes = match args.nodes {
        Some(n) => n,
        None => prompt_nodes(&mut lines)?,
    };
    let load = match args.load {
        Some(l) => l,
        None => prompt_load(&mut lines)?,
    };
    Ok((nodes, load))
}

fn read_line(lines: &mut impl Iterator<Item = io::Result<String>>) -> io::Result<String> {
    lines.next().ok_or_else(|| {
        io::Error::new(io::ErrorKind::UnexpectedEof, "input closed during setup")
    })?
}

fn prompt_nodes(lines: &mut impl Iterator<Item = io::Result<String>>) -> io::Result<u32> {
    loop {
        print!("Please enter the number of nodes: ");
        io::stdout().flush()?;

        match read_line(lines)?.trim().parse::<u32>() {
            Ok(n) if n >= 1 => return Ok(n),
            _ => println!("Invalid node count, please enter an integer >= 1"),
        }
    }
}

fn prompt_load(lines: &mut impl Iterator<Item = io::Result<String>>) -> io::Result<SimLoad> {
    loop {
        println!("1. LOW");
        println!("2. MED");
        println!("3. HIGH");
        println!();
        print!("Please enter the load: ");
        io::stdout().flush()?;

        match read_line(lines)?.trim().parse::<SimLoad>() {
            Ok(load) => return Ok(load),
            Err(_) => println!("\nInvalid load, please reenter load value\n"),
        }
    }
}
