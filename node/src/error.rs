use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] coinvic_ledger::LedgerError),

    #[error("intent error: {0}")]
    Intent(#[from] coinvic_intents::IntentError),

    #[error("store error: {0}")]
    Store(#[from] coinvic_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] coinvic_store_lmdb::LmdbError),

    #[error("key error: {0}")]
    Crypto(#[from] coinvic_crypto::CryptoError),

    /// A production cycle was triggered while another one was running.
    #[error("a block production cycle is already in progress")]
    CycleInProgress,

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RPC server error: {0}")]
    Rpc(String),

    #[error("{0}")]
    Other(String),
}
