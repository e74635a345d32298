//! Block verification against a pinned treasury key.

use coinvic_ledger::{compute_app_data_hash, recompute_block_hash, verify_treasury_signature};
use coinvic_types::{Block, Hash256, PublicKey};

use crate::error::ChainIntegrityError;

/// The last block a wallet accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedTip {
    pub block_number: u64,
    pub block_hash: Hash256,
}

/// Check that `block` hashes to its claimed `block_hash`, that the treasury
/// signature verifies under `treasury`, and that it links onto `tip` when it
/// is the very next block. The first block must link onto the zero hash.
///
/// A block further ahead than `tip + 1` is accepted without a link check;
/// the wallet has skipped the intermediate blocks.
pub fn verify_block(
    block: &Block,
    treasury: &PublicKey,
    tip: Option<&VerifiedTip>,
) -> Result<(), ChainIntegrityError> {
    let computed = recompute_block_hash(block);
    if computed != block.block_hash {
        return Err(ChainIntegrityError::HashMismatch {
            block_number: block.block_number,
            claimed: block.block_hash,
            computed,
        });
    }

    if !verify_treasury_signature(&block.block_hash, &block.treasury_sig, treasury) {
        return Err(ChainIntegrityError::BadSignature {
            block_number: block.block_number,
        });
    }

    let expected_previous = if block.is_first() {
        Some(Hash256::ZERO)
    } else {
        tip.filter(|t| t.block_number + 1 == block.block_number)
            .map(|t| t.block_hash)
    };
    if let Some(expected) = expected_previous {
        if block.previous_block_hash != expected {
            return Err(ChainIntegrityError::BrokenLink {
                block_number: block.block_number,
                expected,
                found: block.previous_block_hash,
            });
        }
    }

    Ok(())
}

/// Check fetched app-data bytes against the hash committed in `block`.
pub fn verify_app_data(block: &Block, app_data: &[u8]) -> Result<(), ChainIntegrityError> {
    let found = compute_app_data_hash(Some(app_data));
    if found != block.app_data_hash {
        return Err(ChainIntegrityError::AppDataMismatch {
            block_number: block.block_number,
            expected: block.app_data_hash,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinvic_crypto::Signer;
    use coinvic_ledger::compute_block_hash;
    use coinvic_types::{Signature, Timestamp};

    fn signed_block(treasury: &mut Signer, number: u64, previous: Hash256, app: &[u8]) -> Block {
        let ephemeral = PublicKey([7; 32]);
        let intents_hash = Hash256::new([1; 32]);
        let app_data_hash = compute_app_data_hash(Some(app));
        let block_hash =
            compute_block_hash(&previous, 100, 5, &intents_hash, &app_data_hash, &ephemeral);
        Block {
            block_number: number,
            previous_block_hash: previous,
            minted_amount: 100,
            burned_amount: 5,
            intents_hash,
            app_data_hash,
            ephemeral_pubkey: ephemeral,
            treasury_sig: treasury.sign(block_hash.to_hex().as_bytes()),
            block_hash,
            timestamp: Timestamp::new(number),
            intent_count: 2,
        }
    }

    #[test]
    fn accepts_a_well_formed_first_block() {
        let mut treasury = Signer::new();
        let pinned = treasury.public_key();
        let block = signed_block(&mut treasury, 1, Hash256::ZERO, b"{}");
        verify_block(&block, &pinned, None).unwrap();
        verify_app_data(&block, b"{}").unwrap();
    }

    #[test]
    fn any_hashed_field_flip_is_detected() {
        let mut treasury = Signer::new();
        let pinned = treasury.public_key();
        let block = signed_block(&mut treasury, 1, Hash256::ZERO, b"{}");

        let mut minted = block.clone();
        minted.minted_amount += 1;
        assert!(matches!(
            verify_block(&minted, &pinned, None),
            Err(ChainIntegrityError::HashMismatch { .. })
        ));

        let mut ephemeral = block.clone();
        ephemeral.ephemeral_pubkey = PublicKey([8; 32]);
        assert!(matches!(
            verify_block(&ephemeral, &pinned, None),
            Err(ChainIntegrityError::HashMismatch { .. })
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let mut impostor = Signer::new();
        let mut treasury = Signer::new();
        let pinned = treasury.public_key();
        let block = signed_block(&mut impostor, 1, Hash256::ZERO, b"{}");
        assert_eq!(
            verify_block(&block, &pinned, None),
            Err(ChainIntegrityError::BadSignature { block_number: 1 })
        );

        let mut zeroed = signed_block(&mut treasury, 1, Hash256::ZERO, b"{}");
        zeroed.treasury_sig = Signature([0; 64]);
        assert!(verify_block(&zeroed, &pinned, None).is_err());
    }

    #[test]
    fn link_is_checked_only_for_the_next_block() {
        let mut treasury = Signer::new();
        let pinned = treasury.public_key();
        let tip = VerifiedTip {
            block_number: 4,
            block_hash: Hash256::new([4; 32]),
        };

        let linked = signed_block(&mut treasury, 5, Hash256::new([4; 32]), b"{}");
        verify_block(&linked, &pinned, Some(&tip)).unwrap();

        let forked = signed_block(&mut treasury, 5, Hash256::new([9; 32]), b"{}");
        assert!(matches!(
            verify_block(&forked, &pinned, Some(&tip)),
            Err(ChainIntegrityError::BrokenLink { block_number: 5, .. })
        ));

        let ahead = signed_block(&mut treasury, 9, Hash256::new([9; 32]), b"{}");
        verify_block(&ahead, &pinned, Some(&tip)).unwrap();
    }

    #[test]
    fn first_block_must_link_onto_zero() {
        let mut treasury = Signer::new();
        let pinned = treasury.public_key();
        let block = signed_block(&mut treasury, 1, Hash256::new([3; 32]), b"{}");
        assert!(matches!(
            verify_block(&block, &pinned, None),
            Err(ChainIntegrityError::BrokenLink { .. })
        ));
    }

    #[test]
    fn app_data_mismatch_is_reported() {
        let mut treasury = Signer::new();
        let block = signed_block(&mut treasury, 1, Hash256::ZERO, br#"{"globalSupply":0}"#);
        assert!(matches!(
            verify_app_data(&block, br#"{"globalSupply":1}"#),
            Err(ChainIntegrityError::AppDataMismatch { .. })
        ));
    }
}
