//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use coinvic_ledger::SystemAccounts;
use coinvic_types::{PublicKey, WalletId};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a Coinvic ledger node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for ledger storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum size of the LMDB memory map, in bytes.
    #[serde(default = "default_map_size")]
    pub lmdb_map_size: usize,

    /// Treasury seed file. Defaults to `treasury.key` inside `data_dir`.
    #[serde(default)]
    pub treasury_key_path: Option<PathBuf>,

    /// Seconds between scheduled production cycles. 0 disables the
    /// scheduler; blocks are then only produced on demand.
    #[serde(default = "default_block_interval")]
    pub block_interval_secs: u64,

    /// Replace the ephemeral block key before every block.
    #[serde(default = "default_true")]
    pub rotate_ephemeral_each_block: bool,

    /// Delete processed intents after each committed block.
    #[serde(default)]
    pub prune_processed_intents: bool,

    /// Account credited by fee intents.
    #[serde(default = "default_fee_wallet")]
    pub fee_wallet: String,

    /// Account that pays out stake intents.
    #[serde(default = "default_staking_wallet")]
    pub staking_reward_wallet: String,

    /// Hex public keys allowed to sign mint and stake intents. Empty means
    /// any valid signer.
    #[serde(default)]
    pub mint_authorities: Vec<String>,

    /// Whether to enable the HTTP server.
    #[serde(default = "default_true")]
    pub enable_rpc: bool,

    /// Address the HTTP server binds to.
    #[serde(default = "default_rpc_bind")]
    pub rpc_bind: String,

    /// HTTP port (if enabled).
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to serve Prometheus metrics on `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./coinvic_data")
}

fn default_map_size() -> usize {
    1 << 30
}

fn default_block_interval() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_fee_wallet() -> String {
    "tx_fee_wallet".to_string()
}

fn default_staking_wallet() -> String {
    "staking_reward_wallet".to_string()
}

fn default_rpc_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    7077
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn treasury_key_path(&self) -> PathBuf {
        self.treasury_key_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("treasury.key"))
    }

    pub fn lmdb_path(&self) -> PathBuf {
        self.data_dir.join("ledger")
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    pub fn system_accounts(&self) -> SystemAccounts {
        SystemAccounts {
            fee_collection: WalletId::new(&self.fee_wallet),
            staking_reward: WalletId::new(&self.staking_reward_wallet),
        }
    }

    /// Parse the configured mint authorities.
    pub fn authorities(&self) -> Result<Vec<PublicKey>, NodeError> {
        self.mint_authorities
            .iter()
            .map(|hex| {
                hex.parse::<PublicKey>()
                    .map_err(|e| NodeError::Config(format!("mint authority {hex}: {e}")))
            })
            .collect()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            lmdb_map_size: default_map_size(),
            treasury_key_path: None,
            block_interval_secs: default_block_interval(),
            rotate_ephemeral_each_block: default_true(),
            prune_processed_intents: false,
            fee_wallet: default_fee_wallet(),
            staking_reward_wallet: default_staking_wallet(),
            mint_authorities: Vec::new(),
            enable_rpc: default_true(),
            rpc_bind: default_rpc_bind(),
            rpc_port: default_rpc_port(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.rpc_port, config.rpc_port);
        assert_eq!(parsed.block_interval_secs, config.block_interval_secs);
        assert_eq!(parsed.fee_wallet, config.fee_wallet);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.rpc_port, 7077);
        assert_eq!(config.block_interval_secs, 60);
        assert!(config.rotate_ephemeral_each_block);
        assert_eq!(config.log_format, "human");
        assert_eq!(config.system_accounts(), SystemAccounts::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            rpc_port = 9999
            block_interval_secs = 5
            fee_wallet = "fees"
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.rpc_port, 9999);
        assert_eq!(config.block_interval_secs, 5);
        assert_eq!(config.system_accounts().fee_collection, WalletId::new("fees"));
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn treasury_key_defaults_into_data_dir() {
        let config = NodeConfig {
            data_dir: PathBuf::from("/var/lib/coinvic"),
            ..NodeConfig::default()
        };
        assert_eq!(
            config.treasury_key_path(),
            PathBuf::from("/var/lib/coinvic/treasury.key")
        );
    }

    #[test]
    fn authorities_are_parsed_from_hex() {
        let config = NodeConfig {
            mint_authorities: vec!["ab".repeat(32)],
            ..NodeConfig::default()
        };
        assert_eq!(config.authorities().unwrap(), vec![PublicKey([0xab; 32])]);

        let bad = NodeConfig {
            mint_authorities: vec!["not-hex".into()],
            ..NodeConfig::default()
        };
        assert!(matches!(bad.authorities(), Err(NodeError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file(Path::new("/nonexistent/coinvic.toml"));
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
