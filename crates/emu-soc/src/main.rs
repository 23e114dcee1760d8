//! Headless runner for the RV32I-subset SoC.
//!
//! Loads a program into program memory, runs until the core halts on an
//! unimplemented instruction (or the cycle budget runs out), and reports
//! the result.
//!
//! Usage:
//!   emu-soc <program> [--cycles N] [--data-size N] [--dump-regs]
//!           [--trace-json FILE] [--config FILE] [--verbose]

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use emu_soc::{Soc, SocConfig, program};
use sim_core::Observable;

/// Run a program on the simulated SoC
#[derive(Parser, Debug)]
#[command(name = "emu-soc", version, about, long_about = None)]
struct Cli {
    /// Program image: raw little-endian binary, or `.hex`/`.txt` with one word per line
    program: PathBuf,

    /// Cycle budget (overrides the config file)
    #[arg(long)]
    cycles: Option<u64>,

    /// Data memory size in bytes (overrides the config file)
    #[arg(long)]
    data_size: Option<usize>,

    /// Print registers and program counter when the run ends
    #[arg(long)]
    dump_regs: bool,

    /// Write acknowledged data-port beats to FILE as JSON
    #[arg(long, value_name = "FILE")]
    trace_json: Option<PathBuf>,

    /// Load SocConfig from a JSON file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log bus arbitration and stage changes
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<SocConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => SocConfig::default(),
    };
    if let Some(cycles) = cli.cycles {
        config.cycle_budget = cycles;
    }
    if let Some(size) = cli.data_size {
        config.data_size = size;
    }
    if cli.trace_json.is_some() {
        config.monitor = true;
    }
    Ok(config)
}

fn dump_regs(soc: &Soc) {
    let core = soc.core();
    for (row, cells) in core.registers().as_slice().chunks(4).enumerate() {
        let line: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(col, value)| {
                let r = row * 4 + col;
                format!("r{r:<2} = {:#010X}", *value as u32)
            })
            .collect();
        println!("{}", line.join("  "));
    }
    println!("pc  = {:#010X}", core.pc());
    if let Some(stage) = soc.query("stage") {
        println!("stage = {stage}");
    }
}

fn run(cli: &Cli) -> Result<bool, Box<dyn Error>> {
    let config = load_config(cli)?;
    let budget = config.cycle_budget;

    let image = program::load_file(&cli.program)?;
    let mut soc = Soc::new(config)?;
    soc.load_program(&image)?;
    eprintln!("Loaded {} ({} bytes)", cli.program.display(), image.len());

    let result = soc.run(budget);
    match &result {
        Ok(cycles) => {
            let retired = soc.core().retired();
            eprintln!("Halted after {cycles} cycles, {retired} instructions retired");
            if let Some(fault) = soc.core().fault() {
                eprintln!("  at {:#010X}: {fault}", soc.core().pc().wrapping_sub(4));
            }
        }
        Err(e) => eprintln!("Run failed: {e}"),
    }

    if cli.dump_regs {
        dump_regs(&soc);
    }

    if let Some(path) = &cli.trace_json {
        let json = serde_json::to_string_pretty(soc.data_trace())?;
        fs::write(path, json)?;
        eprintln!("Trace written to {}", path.display());
    }

    Ok(result.is_ok())
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
