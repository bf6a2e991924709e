//! Operator configuration file handling.
//!
//! Deployment settings only: which contract deployment to talk to, the
//! multisig threshold applied to new proposals, and logging. TOML
//! format, stored under the platform config directory by default.
//!
//! Governance outcomes are NOT configurable here: quorum detection,
//! reveal, and execution follow the votes recorded on the ledger.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default multisig threshold for new proposals
const DEFAULT_REQUIRED_SIGNERS: u32 = 3;

/// VaultGuard operator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Treasury contract deployment
    pub contract: ContractConfig,

    /// Multisig parameters
    #[serde(default)]
    pub multisig: MultisigConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Contract deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Deployed treasury contract address (`0x` + 40 hex characters)
    pub address: String,

    /// JSON-RPC endpoint used to reach the contract
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
}

/// Multisig parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultisigConfig {
    /// Signers required before votes unlock. Applied to every new
    /// proposal at creation; must be at least 1.
    #[serde(default = "default_required_signers")]
    pub required_signers: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_rpc_url() -> String {
    "https://rpc.sepolia.org".to_string()
}

fn default_required_signers() -> u32 {
    DEFAULT_REQUIRED_SIGNERS
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for MultisigConfig {
    fn default() -> Self {
        Self {
            required_signers: DEFAULT_REQUIRED_SIGNERS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl VaultConfig {
    /// Create a new configuration for the given contract deployment
    pub fn new(contract_address: String) -> Self {
        Self {
            contract: ContractConfig {
                address: contract_address,
                rpc_url: default_rpc_url(),
            },
            multisig: MultisigConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: VaultConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        if config.multisig.required_signers == 0 {
            return Err(format!(
                "Invalid config '{}': required_signers must be at least 1",
                path.display()
            )
            .into());
        }

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        format!(
            r#"# VaultGuard Operator Configuration
#
# Deployment settings only: which contract to talk to, the multisig
# threshold for new proposals, and logging. Governance outcomes are not
# configurable here; quorum, reveal, and execution follow the votes
# recorded on the ledger.

[contract]
# Deployed treasury contract address
address = "0x{zero_address}"

# JSON-RPC endpoint
rpc_url = "{rpc_url}"

[multisig]
# Signers required before votes unlock (applied to new proposals)
required_signers = {required_signers}

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/vaultguard/vaultguard.log"
"#,
            zero_address = "0".repeat(40),
            rpc_url = default_rpc_url(),
            required_signers = DEFAULT_REQUIRED_SIGNERS,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Default config file path: `<platform config dir>/vaultguard/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vaultguard")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = VaultConfig::new(format!("0x{}", "0".repeat(40)));

        assert_eq!(config.multisig.required_signers, 3);
        assert_eq!(config.logging.level, "info");
        assert!(config.contract.rpc_url.starts_with("https://"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = VaultConfig::new(format!("0x{}", "a".repeat(40)));
        config.multisig.required_signers = 5;
        config.save(&config_path).unwrap();

        let loaded = VaultConfig::load(&config_path).unwrap();
        assert_eq!(loaded.contract.address, config.contract.address);
        assert_eq!(loaded.multisig.required_signers, 5);
    }

    #[test]
    fn test_create_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        VaultConfig::create_default(&config_path).unwrap();
        assert!(config_path.exists());

        let config = VaultConfig::load(&config_path).unwrap();
        assert_eq!(config.multisig.required_signers, 3);
    }

    #[test]
    fn test_load_config_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        // Minimal config: only the required contract section
        let minimal_config = r#"
[contract]
address = "0x0000000000000000000000000000000000000000"
"#;
        fs::write(&config_path, minimal_config).unwrap();

        let config = VaultConfig::load(&config_path).unwrap();
        assert_eq!(config.multisig.required_signers, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let bad_config = r#"
[contract]
address = "0x0000000000000000000000000000000000000000"

[multisig]
required_signers = 0
"#;
        fs::write(&config_path, bad_config).unwrap();

        assert!(VaultConfig::load(&config_path).is_err());
    }

    #[test]
    fn test_generate_default_toml() {
        let toml = VaultConfig::generate_default_toml();

        assert!(toml.contains("required_signers = 3"));
        assert!(toml.contains("[contract]"));
        // Governance outcomes must not look operator-tunable
        assert!(!toml.contains("approve_threshold"));
    }
}
