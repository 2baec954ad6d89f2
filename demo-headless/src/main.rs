use clap::Parser;
use lbm_cavity_core::{CavityConfig, CavitySimulation, RunError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Lid-driven cavity solver with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "lbm-cavity")]
#[command(about = "D2Q9 TRT lattice Boltzmann lid-driven cavity", long_about = None)]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reynolds number
    #[arg(short, long)]
    reynolds: Option<f64>,

    /// Lid velocity in lattice units
    #[arg(short = 'u', long)]
    lid_velocity: Option<f64>,

    /// Cavity side in lattice nodes
    #[arg(short = 'n', long)]
    length: Option<usize>,

    /// End time, in lid traversals
    #[arg(short, long)]
    t_max: Option<f64>,

    /// Write an image every N iterations
    #[arg(long)]
    output_freq: Option<u64>,

    /// Image side in pixels
    #[arg(long)]
    image_size: Option<u32>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip every file output
    #[arg(long)]
    no_output: bool,

    /// Save the effective configuration to this JSON file and continue
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. "info", "lbm_cavity_core=debug")
    #[arg(long, default_value = "info")]
    log: String,
}

impl Args {
    fn into_config(self) -> Result<(CavityConfig, Option<PathBuf>, bool), RunError> {
        let mut config = match &self.config {
            Some(path) => CavityConfig::from_json_file(path)?,
            None => CavityConfig::default(),
        };
        if let Some(v) = self.reynolds {
            config.reynolds = v;
        }
        if let Some(v) = self.lid_velocity {
            config.lid_velocity = v;
        }
        if let Some(v) = self.length {
            config.length = v;
        }
        if let Some(v) = self.t_max {
            config.t_max = v;
        }
        if let Some(v) = self.output_freq {
            config.output_freq = v;
        }
        if let Some(v) = self.image_size {
            config.image_size = v;
        }
        if let Some(v) = self.output_dir {
            config.output_dir = v;
        }
        Ok((config, self.save_config, self.no_output))
    }
}

fn run(args: Args) -> Result<(), RunError> {
    let (config, save_config, no_output) = args.into_config()?;
    if let Some(path) = save_config {
        config.to_json_file(&path)?;
        info!("Saved configuration to {}", path.display());
    }

    println!("=== Lid-Driven Cavity ===\n");
    println!(
        "Re = {}, u_lid = {}, L = {}, t_max = {}",
        config.reynolds, config.lid_velocity, config.length, config.t_max
    );

    let mut sim = CavitySimulation::new(config)?;
    if no_output {
        sim = sim.without_output();
    }

    let params = *sim.params();
    println!(
        "nu = {:.5}, tau = {:.4}, dt = {:.3e}, {} iterations\n",
        params.lattice.nu_lbm,
        params.lattice.tau_lbm,
        params.lattice.dt,
        params.it_max + 1
    );

    let report_every = ((params.it_max + 1) / 20).max(1);
    let summary = sim.run_with_progress(|it, total| {
        if it % report_every == 0 || it == total {
            info!("{:>5.1}% ({}/{})", 100.0 * it as f64 / total as f64, it, total);
        }
    })?;

    println!("\n=== Summary ===");
    println!("Iterations: {}", summary.iterations);
    println!("Elapsed: {:.2}s ({:.1} MLUPS)", summary.elapsed.as_secs_f64(), summary.mlups);
    match summary.error {
        Some(err) => println!(
            "L2 error vs Ghia et al.: ux {:.4}, uy {:.4}, combined {:.4}",
            err.ux, err.uy, err.combined
        ),
        None => println!("No benchmark data for Re = {}", params.lattice.re_lbm),
    }
    if !no_output {
        println!("Output written to {}", sim.config().output_dir.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
