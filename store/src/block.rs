//! Block storage trait.

use crate::StoreError;
use coinvic_types::Block;

pub trait BlockTable {
    fn get_block(&self, block_number: u64) -> Result<Option<Block>, StoreError>;

    /// The block with the highest number, or `None` before the first block.
    fn latest_block(&self) -> Result<Option<Block>, StoreError>;

    fn block_count(&self) -> Result<u64, StoreError>;

    /// Up to `limit` blocks starting at `from` (inclusive), ascending.
    fn blocks_range(&self, from: u64, limit: usize) -> Result<Vec<Block>, StoreError>;
}
