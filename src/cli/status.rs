//! `status` command: show the resolved operator configuration.

use super::VaultConfig;
use std::error::Error;
use std::path::Path;

pub fn run(config_path: &Path, config: &VaultConfig) -> Result<(), Box<dyn Error>> {
    println!("Config file:      {}", config_path.display());
    println!("Contract address: {}", config.contract.address);
    println!("RPC endpoint:     {}", config.contract.rpc_url);
    println!("Required signers: {}", config.multisig.required_signers);
    println!("Log level:        {}", config.logging.level);
    Ok(())
}
