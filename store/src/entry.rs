//! Ledger entry storage trait.

use crate::StoreError;
use coinvic_types::LedgerEntry;

pub trait EntryTable {
    /// Entries recorded by one block, in application order.
    fn entries_for_block(&self, block_number: u64) -> Result<Vec<LedgerEntry>, StoreError>;

    fn entry_count(&self) -> Result<u64, StoreError>;
}
