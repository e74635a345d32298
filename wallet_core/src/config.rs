use std::time::Duration;

use serde::{Deserialize, Serialize};

use coinvic_types::PublicKey;

/// Settings for [`crate::WalletSyncClient`] and its HTTP source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the node, e.g. `http://127.0.0.1:7077`.
    #[serde(default = "default_node_url")]
    pub node_url: String,
    /// Blocks must carry this key's signature.
    pub treasury_pubkey: PublicKey,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Attempts per fetch before a transport error is surfaced.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Reject app-data snapshots whose hash differs from the block's
    /// `app_data_hash`.
    #[serde(default)]
    pub strict_app_data: bool,
}

fn default_node_url() -> String {
    "http://127.0.0.1:7077".into()
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_backoff_initial_ms() -> u64 {
    250
}

fn default_backoff_max_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl SyncConfig {
    pub fn new(node_url: impl Into<String>, treasury_pubkey: PublicKey) -> Self {
        Self {
            node_url: node_url.into(),
            treasury_pubkey,
            poll_interval_ms: default_poll_interval_ms(),
            retry_attempts: default_retry_attempts(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            strict_app_data: false,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Delay before retry number `retry` (0-based): doubles from the initial
    /// delay, capped at the maximum.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
        let ms = self
            .backoff_initial_ms
            .saturating_mul(factor)
            .min(self.backoff_max_ms);
        Duration::from_millis(ms)
    }
}
