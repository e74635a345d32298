//! Paging for `GET /blocks`.
//!
//! Blocks are addressed by number, so the cursor is simply the next block
//! number to fetch.

use serde::{Deserialize, Serialize};

use coinvic_types::Block;

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockPageParams {
    /// First block number to return. Defaults to 1.
    pub from: Option<u64>,
    /// Number of blocks per page (default 100, max 1000).
    pub count: Option<u32>,
}

impl BlockPageParams {
    /// Effective page size, clamped to `[1, MAX_PAGE_SIZE]`.
    pub fn effective_count(&self) -> u32 {
        self.count.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn start(&self) -> u64 {
        self.from.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockPage {
    pub blocks: Vec<Block>,
    /// `from` for the next page, or `None` on the last page.
    pub next: Option<u64>,
}

impl BlockPage {
    /// A short page means the end of the chain was reached.
    pub fn new(blocks: Vec<Block>, page_size: u32) -> Self {
        let next = if blocks.len() < page_size as usize {
            None
        } else {
            blocks.last().map(|b| b.block_number + 1)
        };
        Self { blocks, next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinvic_types::{Hash256, PublicKey, Signature, Timestamp};

    fn block(n: u64) -> Block {
        Block {
            block_number: n,
            previous_block_hash: Hash256::ZERO,
            minted_amount: 0,
            burned_amount: 0,
            intents_hash: Hash256::ZERO,
            app_data_hash: Hash256::ZERO,
            ephemeral_pubkey: PublicKey([0; 32]),
            treasury_sig: Signature([0; 64]),
            block_hash: Hash256::ZERO,
            timestamp: Timestamp::EPOCH,
            intent_count: 1,
        }
    }

    #[test]
    fn count_defaults_and_clamps() {
        assert_eq!(BlockPageParams::default().effective_count(), 100);
        let big = BlockPageParams {
            from: None,
            count: Some(5000),
        };
        assert_eq!(big.effective_count(), 1000);
        let zero = BlockPageParams {
            from: Some(0),
            count: Some(0),
        };
        assert_eq!(zero.effective_count(), 1);
        assert_eq!(zero.start(), 1);
    }

    #[test]
    fn full_page_points_at_next_block() {
        let page = BlockPage::new(vec![block(3), block(4)], 2);
        assert_eq!(page.next, Some(5));
    }

    #[test]
    fn short_page_is_last() {
        let page = BlockPage::new(vec![block(3)], 2);
        assert_eq!(page.next, None);
        assert_eq!(BlockPage::new(Vec::new(), 2).next, None);
    }
}
