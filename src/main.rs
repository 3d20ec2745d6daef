use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use csma_sim::{format_utilization, load_config, write_utilization, Scheduler};

/// CSMA channel simulator
///
/// Reads N, L, M, R and T from a parameter file, runs the simulation for T
/// ticks and writes the link utilization with two decimals.
#[derive(Parser, Debug)]
#[command(name = "csma_sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Parameter file
    input: PathBuf,

    /// File that receives the utilization
    #[arg(short, long, default_value = "output.txt")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    println!("... CSMA simulator is started ...");

    let config = load_config(&args.input)
        .with_context(|| format!("failed to load parameters from {}", args.input.display()))?;

    let mut scheduler = Scheduler::new(&config)?;
    let report = scheduler.run()?;
    let utilization = report.utilization()?;

    report.print_stats();
    println!("{}", format_utilization(utilization));

    write_utilization(&args.output, utilization)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("done");
    Ok(())
}
