//! Block hash derivation.
//!
//! ```text
//! block_hash = sha256_hex(previous_block_hash ‖ minted_amount ‖ burned_amount
//!                         ‖ intents_hash ‖ app_data_hash ‖ ephemeral_pubkey)
//! ```
//!
//! Digests and the key enter as lowercase hex, amounts as decimal integers,
//! with no separators. The treasury signs the UTF-8 bytes of the resulting
//! hex string.

use coinvic_crypto::{sha256_hash, verify_signature};
use coinvic_intents::canonical_intent;
use coinvic_types::{Block, Hash256, Intent, PublicKey, Signature};

/// The exact string whose SHA-256 is the block hash.
pub fn block_hash_input(
    previous_block_hash: &Hash256,
    minted_amount: u128,
    burned_amount: u128,
    intents_hash: &Hash256,
    app_data_hash: &Hash256,
    ephemeral_pubkey: &PublicKey,
) -> String {
    format!(
        "{previous_block_hash}{minted_amount}{burned_amount}{intents_hash}{app_data_hash}{ephemeral_pubkey}"
    )
}

pub fn compute_block_hash(
    previous_block_hash: &Hash256,
    minted_amount: u128,
    burned_amount: u128,
    intents_hash: &Hash256,
    app_data_hash: &Hash256,
    ephemeral_pubkey: &PublicKey,
) -> Hash256 {
    let input = block_hash_input(
        previous_block_hash,
        minted_amount,
        burned_amount,
        intents_hash,
        app_data_hash,
        ephemeral_pubkey,
    );
    sha256_hash(input.as_bytes())
}

/// Recompute a block's hash from its hashed fields, ignoring the stored
/// `block_hash`.
pub fn recompute_block_hash(block: &Block) -> Hash256 {
    compute_block_hash(
        &block.previous_block_hash,
        block.minted_amount,
        block.burned_amount,
        &block.intents_hash,
        &block.app_data_hash,
        &block.ephemeral_pubkey,
    )
}

/// SHA-256 of the canonical intents joined with `|`, in batch order.
pub fn compute_intents_hash(intents: &[Intent]) -> Hash256 {
    let joined = intents
        .iter()
        .map(canonical_intent)
        .collect::<Vec<_>>()
        .join("|");
    sha256_hash(joined.as_bytes())
}

/// SHA-256 of the app-data snapshot; an absent snapshot hashes as empty.
pub fn compute_app_data_hash(app_data: Option<&[u8]>) -> Hash256 {
    sha256_hash(app_data.unwrap_or_default())
}

/// Check `signature` over the hex form of `block_hash`.
pub fn verify_treasury_signature(
    block_hash: &Hash256,
    signature: &Signature,
    treasury: &PublicKey,
) -> bool {
    verify_signature(block_hash.to_hex().as_bytes(), signature, treasury)
}
