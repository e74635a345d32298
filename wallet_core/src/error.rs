use thiserror::Error;

use coinvic_types::Hash256;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("key error: {0}")]
    Key(String),

    #[error("invalid intent: {0}")]
    InvalidIntent(String),

    #[error("node error: {0}")]
    Node(String),

    #[error("node rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
}

impl From<coinvic_crypto::CryptoError> for WalletError {
    fn from(e: coinvic_crypto::CryptoError) -> Self {
        WalletError::Key(e.to_string())
    }
}

/// A block or snapshot that fails verification against the pinned treasury
/// key or the last verified block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainIntegrityError {
    #[error("block {block_number}: hash mismatch (claimed {claimed}, computed {computed})")]
    HashMismatch {
        block_number: u64,
        claimed: Hash256,
        computed: Hash256,
    },

    #[error("block {block_number}: treasury signature does not verify")]
    BadSignature { block_number: u64 },

    #[error("block {block_number}: previous hash {found} does not match {expected}")]
    BrokenLink {
        block_number: u64,
        expected: Hash256,
        found: Hash256,
    },

    #[error("block {block_number}: app data hash {found} does not match block ({expected})")]
    AppDataMismatch {
        block_number: u64,
        expected: Hash256,
        found: Hash256,
    },
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or server failure; retried with backoff.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Integrity(#[from] ChainIntegrityError),

    #[error("sync client stopped")]
    Stopped,
}

impl SyncError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_errors_are_transient() {
        assert!(SyncError::Transport("timeout".into()).is_transient());
        assert!(!SyncError::InvalidResponse("bad json".into()).is_transient());
        assert!(!SyncError::Stopped.is_transient());
        let integrity: SyncError = ChainIntegrityError::BadSignature { block_number: 3 }.into();
        assert!(!integrity.is_transient());
    }
}
