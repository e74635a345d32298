//! Block type.

use serde::{Deserialize, Serialize};

use crate::hash::Hash256;
use crate::keys::{PublicKey, Signature};
use crate::time::Timestamp;

/// A signed, hash-chained batch of processed intents.
///
/// `block_hash` is the SHA-256 of the string
/// `previous_block_hash ‖ minted_amount ‖ burned_amount ‖ intents_hash ‖
/// app_data_hash ‖ ephemeral_pubkey` (hex digests, decimal amounts, no
/// separators). `treasury_sig` signs the hex form of `block_hash`.
/// `timestamp` and `intent_count` are informational and not hashed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_number: u64,
    pub previous_block_hash: Hash256,
    #[serde(with = "crate::amount::decimal")]
    pub minted_amount: u128,
    #[serde(with = "crate::amount::decimal")]
    pub burned_amount: u128,
    pub intents_hash: Hash256,
    pub app_data_hash: Hash256,
    pub ephemeral_pubkey: PublicKey,
    pub treasury_sig: Signature,
    pub block_hash: Hash256,
    pub timestamp: Timestamp,
    pub intent_count: u32,
}

impl Block {
    pub fn is_first(&self) -> bool {
        self.block_number == 1
    }

    /// Whether `self` links directly onto `previous`.
    pub fn follows(&self, previous: &Block) -> bool {
        self.block_number == previous.block_number + 1
            && self.previous_block_hash == previous.block_hash
    }
}
