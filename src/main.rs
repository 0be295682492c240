use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thermonet_core::init_logging;
use thermonet_lib::app::App;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a network and run its era schedule
    Run {
        /// Network config file
        #[arg(short, long, default_value = "configs/network.toml")]
        config: PathBuf,

        /// Override the configured seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Directory that receives the run directory
        #[arg(short, long, default_value = "runs")]
        output: PathBuf,

        /// Run name (defaults to a timestamp)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Build a network and print its construction report
    Check {
        /// Network config file
        #[arg(short, long, default_value = "configs/network.toml")]
        config: PathBuf,

        /// Override the configured seed
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    match args.command {
        Command::Run {
            config,
            seed,
            output,
            name,
        } => {
            let app = App::load(&config)?.with_seed(seed);
            let outcome = app.run(&output, name.as_deref())?;
            println!("Run written to {}", outcome.path.display());
            println!("Seed: {}", outcome.seed);
            println!("{}", serde_json::to_string_pretty(&outcome.report)?);
            if let Some(last) = outcome.summary.epochs.last() {
                println!(
                    "Final epoch {}: solved {:.1}%, free energy {:.4}",
                    last.epoch, last.summary.percent_solved, last.free_energy
                );
            }
        }
        Command::Check { config, seed } => {
            let app = App::load(&config)?.with_seed(seed);
            let report = app.check()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
