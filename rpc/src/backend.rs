//! The ledger operations the HTTP layer routes to.

use serde::{Deserialize, Serialize};

use coinvic_types::{Block, Hash256, Intent, LedgerAccount, PublicKey};

use crate::error::RpcError;

/// Node status returned by `GET /health`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub chain_height: u64,
    pub latest_block_hash: Option<Hash256>,
    pub pending_intents: u64,
    /// Key that verifies every block's `treasury_sig`.
    pub treasury_pubkey: PublicKey,
}

/// Everything the HTTP server needs from a node.
///
/// Methods are blocking. `generate_block` runs a full production cycle and is
/// called from a blocking task; the rest are short store reads.
pub trait LedgerBackend: Send + Sync + 'static {
    fn submit_intent(&self, intent: Intent) -> Result<(), RpcError>;

    fn latest_block(&self) -> Result<Option<Block>, RpcError>;

    fn blocks(&self, from: u64, limit: usize) -> Result<Vec<Block>, RpcError>;

    fn master_ledger(&self) -> Result<Vec<LedgerAccount>, RpcError>;

    /// Raw application-data snapshot bytes, if one is stored.
    fn app_data(&self) -> Result<Option<Vec<u8>>, RpcError>;

    /// Run a production cycle now. `Ok(None)` when there was nothing to do.
    fn generate_block(&self) -> Result<Option<Block>, RpcError>;

    /// Prometheus text exposition.
    fn metrics_text(&self) -> Result<String, RpcError>;

    fn health(&self) -> Result<HealthReport, RpcError>;
}
