//! Moment command-line interface.
//!
//! Drive the excitation and partition phases of a simulation:
//! ```sh
//! moment excitation --inputdir ./input --simudir ./simu
//! mpirun -n 4 moment prepare-partition --inputdir ./input --simudir ./simu
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "moment")]
#[command(about = "Moment: RWG Method-of-Moments excitation and partition tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the excitation vector of the configured source.
    Excitation {
        /// Directory holding simulation_parameters.toml and the mesh.
        #[arg(long)]
        inputdir: PathBuf,
        /// Simulation working directory.
        #[arg(long)]
        simudir: PathBuf,
    },
    /// Write the per-rank SAI preconditioner inputs from the partition checkpoints.
    ///
    /// Launch under mpirun/srun (with the `mpi` feature) for one process per rank.
    PreparePartition {
        /// Directory holding simulation_parameters.toml.
        #[arg(long)]
        inputdir: PathBuf,
        /// Simulation working directory with one tmp<rank> area per rank.
        #[arg(long)]
        simudir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Excitation { inputdir, simudir } => {
            println!("Moment Excitation");
            println!("=================");
            println!("Input: {}", inputdir.display());
            runner::run_excitation(&inputdir, &simudir)?;
            println!("Excitation complete.");
            Ok(())
        }
        Commands::PreparePartition { inputdir, simudir } => {
            println!("Moment SAI Partition");
            println!("====================");
            println!("Simulation directory: {}", simudir.display());
            runner::run_prepare_partition(&inputdir, &simudir)?;
            println!("Partition prepared.");
            Ok(())
        }
    }
}
