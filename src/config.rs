//! Binary configuration: TOML file with environment overrides.
//!
//! The library itself takes its endpoint and addresses as plain
//! arguments; this module only feeds the `attendance-nft` binary.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration for the `attendance-nft` binary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chain RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Deployed contract account, hex or SS58; empty means simulated
    #[serde(default)]
    pub contract_address: String,
    /// ink! metadata JSON path
    #[serde(default = "default_metadata_path")]
    pub metadata_path: String,
}

fn default_rpc_url() -> String {
    "ws://127.0.0.1:9944".to_string()
}

fn default_metadata_path() -> String {
    crate::contract::metadata::DEFAULT_METADATA_FILE.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            contract_address: String::new(),
            metadata_path: default_metadata_path(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file if it exists (defaults otherwise), then
    /// apply `ATTENDANCE_RPC_URL`, `ATTENDANCE_CONTRACT_ADDRESS`, and
    /// `ATTENDANCE_METADATA_PATH` overrides.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut cfg = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            Self::default()
        };

        if let Ok(v) = std::env::var("ATTENDANCE_RPC_URL") {
            cfg.rpc_url = v;
        }
        if let Ok(v) = std::env::var("ATTENDANCE_CONTRACT_ADDRESS") {
            cfg.contract_address = v;
        }
        if let Ok(v) = std::env::var("ATTENDANCE_METADATA_PATH") {
            cfg.metadata_path = v;
        }

        Ok(cfg)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File read failure
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse failure
    #[error("config parse error: {0}")]
    Parse(String),
}
