//! Command-line interface.

mod config;
mod simulate;
mod status;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use config::VaultConfig;

#[derive(Parser)]
#[command(
    name = "vaultguard",
    version,
    about = "Confidential multisig treasury governance registry"
)]
pub struct Cli {
    /// Path to the operator config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default operator configuration file
    Init,
    /// Show the resolved operator configuration
    Status,
    /// Run a scripted proposal lifecycle against in-memory backends
    Simulate(simulate::SimulateArgs),
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli.config.unwrap_or_else(config::default_config_path);

    match cli.command {
        Commands::Init => {
            VaultConfig::create_default(&config_path)?;
            println!("Wrote default configuration to {}", config_path.display());
            Ok(())
        }
        Commands::Status => {
            let config = VaultConfig::load(&config_path)?;
            init_tracing(&config);
            status::run(&config_path, &config)
        }
        Commands::Simulate(args) => {
            // The simulator runs entirely in memory; a config file is
            // optional and only read for the threshold and log level.
            let config = if config_path.exists() {
                VaultConfig::load(&config_path)?
            } else {
                VaultConfig::new(format!("0x{}", "0".repeat(40)))
            };
            init_tracing(&config);
            simulate::run(&config, args).await
        }
    }
}

fn init_tracing(config: &VaultConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
