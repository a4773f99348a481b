//! MMU Simulator - Main Entry Point
//!
//! Usage: mmu_sim [OPTIONS] [SCRIPT]
//!
//! Reads commands (READ, READN, WRITE, WRITEW, WRITEDW, WRITEZ, HALT) from
//! SCRIPT, or from stdin when no script is given, and prints read results
//! to stdout.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record, info};

use mmu_sim::session::Session;
use mmu_sim::{DEFAULT_PAGEFILE, DEFAULT_TICK_INTERVAL, SimConfig};

/// Simulated MMU with demand paging and aging page replacement
#[derive(Parser, Debug)]
#[command(name = "mmu_sim", version)]
struct Cli {
    /// Command script; stdin when omitted
    script: Option<PathBuf>,

    /// Paging file, recreated on every start
    #[arg(short, long, default_value = DEFAULT_PAGEFILE)]
    pagefile: PathBuf,

    /// Memory accesses between aging ticks (0 disables the clock)
    #[arg(short, long, default_value_t = DEFAULT_TICK_INTERVAL)]
    tick_interval: u32,

    /// Print page faults, evictions and a summary
    #[arg(short, long)]
    verbose: bool,
}

/// Writes log records to stderr
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Run the simulation and handle any errors
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main logic separated from main() for cleaner error handling
fn run(cli: &Cli) -> mmu_sim::Result<()> {
    let config = SimConfig::default()
        .with_pagefile(&cli.pagefile)
        .with_tick_interval(cli.tick_interval);

    let input: Box<dyn BufRead> = match &cli.script {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut session = Session::new(&config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stats = session.run(input, &mut out)?;
    out.flush()?;

    info!("=== Summary ===");
    info!("Accesses:    {}", stats.accesses);
    info!("Hits:        {}", stats.hits);
    info!("Page faults: {}", stats.page_faults);
    info!("Evictions:   {}", stats.evictions);
    info!("Write-backs: {}", stats.write_backs);

    session.shutdown()
}
