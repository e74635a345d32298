//! LMDB implementation of BlockTable.

use coinvic_store::{BlockTable, StoreError};
use coinvic_types::Block;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

pub(crate) fn block_key(block_number: u64) -> [u8; 8] {
    block_number.to_be_bytes()
}

impl BlockTable for LmdbEnvironment {
    fn get_block(&self, block_number: u64) -> Result<Option<Block>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = block_key(block_number);
        match self
            .blocks_db
            .get(&rtxn, &key[..])
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn latest_block(&self) -> Result<Option<Block>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self.blocks_db.last(&rtxn).map_err(LmdbError::from)? {
            Some((_key, bytes)) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn block_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.blocks_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn blocks_range(&self, from: u64, limit: usize) -> Result<Vec<Block>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut blocks = Vec::new();
        for number in (from..).take(limit) {
            let key = block_key(number);
            let Some(bytes) = self
                .blocks_db
                .get(&rtxn, &key[..])
                .map_err(LmdbError::from)?
            else {
                break;
            };
            blocks.push(bincode::deserialize(bytes).map_err(LmdbError::from)?);
        }
        Ok(blocks)
    }
}
