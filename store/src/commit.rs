//! Atomic block commit.

use crate::{AccountTable, AppDataStore, BlockTable, EntryTable, IntentTable, StoreError};
use coinvic_types::{Block, IntentId, LedgerAccount, LedgerEntry};

/// Everything one production cycle writes.
#[derive(Clone, Debug)]
pub struct BlockCommit {
    pub block: Block,
    /// Final rows for every account the block touched.
    pub accounts: Vec<LedgerAccount>,
    pub entries: Vec<LedgerEntry>,
    /// Every intent consumed by the block, applied or skipped.
    pub processed: Vec<IntentId>,
}

/// A complete ledger backend.
pub trait LedgerStore:
    IntentTable + BlockTable + AccountTable + EntryTable + AppDataStore + Send + Sync
{
    /// Persist the block, account rows, entries and processed flags in a
    /// single transaction.
    ///
    /// Fails with [`StoreError::Conflict`] unless `commit.block.block_number`
    /// is exactly one above the latest stored block (or 1 for an empty
    /// chain). On any error nothing is written.
    fn commit_block(&self, commit: &BlockCommit) -> Result<(), StoreError>;
}

/// Check that `block_number` extends the chain whose tip is `latest`.
pub fn check_next_block_number(latest: Option<u64>, block_number: u64) -> Result<(), StoreError> {
    let expected = latest.map(|n| n + 1).unwrap_or(1);
    if block_number != expected {
        return Err(StoreError::Conflict(format!(
            "block {block_number} does not extend chain (expected {expected})"
        )));
    }
    Ok(())
}
