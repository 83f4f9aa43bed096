//! CLI for the budget-optimization pipeline: generate synthetic channel
//! benchmarks and allocate the configured budget across them.
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use budget_optimizer::allocation::solver::{solve_with, BackendChoice, MarginalEqualizer};
use budget_optimizer::allocation::AllocationProblem;
use budget_optimizer::config::load_config;
use budget_optimizer::synth::{
    curves_from_benchmarks, generate_benchmarks, read_benchmarks_csv, write_benchmarks_csv,
};

#[derive(Parser)]
#[command(name = "budget-optimizer", about = "Budget optimization tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate synthetic channel benchmarks and write them to CSV.
    Synth {
        /// Path to the plan config file.
        #[arg(long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Output CSV path.
        #[arg(long, default_value = "data/raw/channel_benchmarks.csv")]
        out: PathBuf,
    },

    /// Allocate the configured budget across channels.
    Optimize {
        /// Path to the plan config file.
        #[arg(long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Benchmark CSV to optimize over; generated from the config's
        /// synth_data section when omitted.
        #[arg(long)]
        benchmarks: Option<PathBuf>,

        /// Write the result table to this CSV path.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Synth { config, out } => cmd_synth(&config, &out),
        Command::Optimize { config, benchmarks, out } => {
            cmd_optimize(&config, benchmarks.as_deref(), out.as_deref())
        }
    }
}

fn cmd_synth(config_path: &Path, out: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    info!("generating synthetic channel benchmarks");
    let benchmarks = generate_benchmarks(&config)?;

    ensure_parent_dir(out)?;
    write_benchmarks_csv(&benchmarks, out)?;
    info!(rows = benchmarks.len(), path = %out.display(), "benchmarks written");

    for bench in &benchmarks {
        let roi_at_max = bench.curve_a - 2.0 * bench.curve_b * bench.max_spend;
        info!(
            channel = %bench.channel,
            max_spend = bench.max_spend,
            roi_at_max,
            "benchmark summary"
        );
    }
    Ok(())
}

fn cmd_optimize(
    config_path: &Path, benchmarks_path: Option<&Path>, out: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let benchmarks = match benchmarks_path {
        Some(path) => {
            info!(path = %path.display(), "loading channel benchmarks");
            read_benchmarks_csv(path)?
        }
        None => {
            info!("no benchmark file given; generating from config");
            generate_benchmarks(&config)?
        }
    };

    let curves = curves_from_benchmarks(&benchmarks)?;
    let problem = AllocationProblem::new(curves, config.total_budget())?;
    let opts = config.solve_options()?;
    info!(
        budget = config.budget.total,
        currency = %config.budget.currency,
        channels = problem.len(),
        "allocating budget"
    );

    let result = match config.backend_choice()? {
        BackendChoice::MarginalEqualization => solve_with(&problem, &MarginalEqualizer, &opts)?,
    };

    println!("{result}");
    if !result.converged {
        warn!(
            iterations = result.iterations,
            "optimization did not converge; allocation is best-effort"
        );
    }

    // Explicit --out wins; otherwise results land in the configured
    // results directory.
    let out_path = match out {
        Some(path) => path.to_path_buf(),
        None => config.output.results_dir.join("allocation.csv"),
    };
    ensure_parent_dir(&out_path)?;
    let file = File::create(&out_path)
        .with_context(|| format!("creating results file {}", out_path.display()))?;
    result.write_csv(file)?;
    info!(path = %out_path.display(), "results written");
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }
    Ok(())
}
