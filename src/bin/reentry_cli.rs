use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use reentry_engine::{
    circular_error_probable, mc_run, update_aimpoint, RunConfig, SimError,
};

#[derive(Parser)]
#[command(name = "reentry")]
#[command(version = "0.1.0")]
#[command(about = "Monte Carlo reentry vehicle trajectory simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Monte Carlo impact dispersion ensemble
    Run {
        /// Run configuration file (TOML)
        #[arg(short = 'c', long)]
        config: PathBuf,
    },

    /// Solve for the thrust angles that hit a target point
    Aim {
        /// Run configuration file (TOML)
        #[arg(short = 'c', long)]
        config: PathBuf,

        /// Target latitude (degrees)
        #[arg(long)]
        lat: f64,

        /// Target longitude (degrees)
        #[arg(long)]
        lon: f64,
    },
}

fn run(cli: Cli) -> Result<(), SimError> {
    match cli.command {
        Commands::Run { config } => {
            let config = RunConfig::from_toml_file(config)?;
            let ensemble = mc_run(&config)?;
            println!(
                "{}: {} impacts, CEP = {:.1} m",
                config.run_name,
                ensemble.len(),
                circular_error_probable(&ensemble)
            );
            if config.impact_output {
                println!("impact data written to {}", config.impact_data_path.display());
            }
        }
        Commands::Aim { config, lat, lon } => {
            let mut config = RunConfig::from_toml_file(config)?;
            let target = nalgebra::Vector3::new(
                reentry_engine::constants::EARTH_RADIUS_M,
                lon.to_radians(),
                lat.to_radians(),
            );
            let aim = reentry_engine::coords::spher_to_cart(&target);
            config.x_aim = aim.x;
            config.y_aim = aim.y;
            config.z_aim = aim.z;

            let solution = update_aimpoint(&config)?;
            println!(
                "theta_long = {:.6} rad, theta_lat = {:.6} rad, miss = {:.1} m",
                solution.theta_long, solution.theta_lat, solution.miss
            );
        }
    }
    Ok(())
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
