//! Where a wallet reads the chain from.

use std::future::Future;

use coinvic_types::{Block, LedgerAccount};

use crate::error::SyncError;

/// Read side of a ledger service, as seen by the sync client.
///
/// [`crate::LedgerClient`] implements this over HTTP; tests substitute an
/// in-memory source.
pub trait LedgerSource: Send + Sync {
    /// The newest block, or `None` while the chain is empty.
    fn latest_block(&self) -> impl Future<Output = Result<Option<Block>, SyncError>> + Send;

    /// Every account row of the master ledger.
    fn ledger_snapshot(&self) -> impl Future<Output = Result<Vec<LedgerAccount>, SyncError>> + Send;

    /// The raw application-data snapshot bytes.
    fn app_data_snapshot(&self) -> impl Future<Output = Result<Vec<u8>, SyncError>> + Send;
}
