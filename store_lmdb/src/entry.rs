//! LMDB implementation of EntryTable.

use std::ops::Bound;

use coinvic_store::{EntryTable, StoreError};
use coinvic_types::LedgerEntry;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

/// `block_number_be(8) ++ index_be(4)`.
pub(crate) fn entry_key(block_number: u64, index: u32) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..8].copy_from_slice(&block_number.to_be_bytes());
    key[8..].copy_from_slice(&index.to_be_bytes());
    key
}

impl EntryTable for LmdbEnvironment {
    fn entries_for_block(&self, block_number: u64) -> Result<Vec<LedgerEntry>, StoreError> {
        let lower = entry_key(block_number, 0);
        let upper = entry_key(block_number + 1, 0);
        let bounds = (
            Bound::Included(&lower[..]),
            Bound::Excluded(&upper[..]),
        );

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .entries_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for result in iter {
            let (_key, bytes) = result.map_err(LmdbError::from)?;
            entries.push(bincode::deserialize(bytes).map_err(LmdbError::from)?);
        }
        Ok(entries)
    }

    fn entry_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.entries_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
