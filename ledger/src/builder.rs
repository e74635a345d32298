//! Block assembly and signing.

use tracing::{debug, info};

use coinvic_crypto::Signer;
use coinvic_types::{Block, Hash256, Intent, PublicKey, Timestamp};

use crate::hashing::{compute_app_data_hash, compute_block_hash, compute_intents_hash};
use crate::master::ApplyOutcome;

/// Seals batches of intents into signed, hash-chained blocks.
///
/// Holds two signers. The treasury signer is long-lived; its public key is
/// what clients pin and it signs every `block_hash`. The ephemeral signer's
/// public key is recorded in each block and, when `rotate_each_block` is set,
/// is replaced before every block.
pub struct BlockBuilder {
    treasury: Signer,
    ephemeral: Signer,
    rotate_each_block: bool,
}

impl BlockBuilder {
    pub fn new(treasury: Signer, ephemeral: Signer, rotate_each_block: bool) -> Self {
        Self {
            treasury,
            ephemeral,
            rotate_each_block,
        }
    }

    pub fn treasury_public_key(&mut self) -> PublicKey {
        self.treasury.public_key()
    }

    /// Retired ephemeral keys, oldest first.
    pub fn ephemeral_history(&self) -> &[PublicKey] {
        self.ephemeral.history()
    }

    /// Build the block that follows `previous` for `intents`.
    ///
    /// `outcome` is the ledger's staged application of the same batch; only
    /// intents it applied count towards `minted_amount` and `burned_amount`,
    /// while `intents_hash` covers the whole batch. Returns `None` for an
    /// empty batch: no empty blocks are produced.
    pub fn produce(
        &mut self,
        previous: Option<&Block>,
        intents: &[Intent],
        outcome: &ApplyOutcome,
        app_data: Option<&[u8]>,
        timestamp: Timestamp,
    ) -> Option<Block> {
        if intents.is_empty() {
            debug!("no intents, skipping block");
            return None;
        }

        let intents_hash = compute_intents_hash(intents);
        let app_data_hash = compute_app_data_hash(app_data);
        let minted_amount = outcome.minted;
        let burned_amount = outcome.burned;

        let ephemeral_pubkey = if self.rotate_each_block {
            self.ephemeral.rotate()
        } else {
            self.ephemeral.public_key()
        };

        let (block_number, previous_block_hash) = match previous {
            Some(prev) => (prev.block_number + 1, prev.block_hash),
            None => (1, Hash256::ZERO),
        };

        let block_hash = compute_block_hash(
            &previous_block_hash,
            minted_amount,
            burned_amount,
            &intents_hash,
            &app_data_hash,
            &ephemeral_pubkey,
        );
        let treasury_sig = self.treasury.sign(block_hash.to_hex().as_bytes());

        info!(
            block = block_number,
            hash = %block_hash,
            intents = intents.len(),
            minted = %minted_amount,
            burned = %burned_amount,
            "block produced"
        );

        Some(Block {
            block_number,
            previous_block_hash,
            minted_amount,
            burned_amount,
            intents_hash,
            app_data_hash,
            ephemeral_pubkey,
            treasury_sig,
            block_hash,
            timestamp,
            intent_count: u32::try_from(intents.len()).unwrap_or(u32::MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::{recompute_block_hash, verify_treasury_signature};
    use coinvic_types::{IntentKind, IntentPayload, Signature, WalletId};

    fn intent(id: &str, kind: IntentKind, amount: u128) -> Intent {
        Intent {
            id: id.into(),
            kind,
            payload: IntentPayload {
                wallet: Some(WalletId::new("w1")),
                from: None,
                to: None,
                amount,
                network: "main".into(),
                reason: None,
                transaction_id: id.into(),
            },
            signer_pub: PublicKey([1u8; 32]),
            signature: Signature([2u8; 64]),
            created_at: Timestamp::new(7),
            processed: false,
        }
    }

    fn builder(rotate: bool) -> BlockBuilder {
        BlockBuilder::new(Signer::from_seed(&[1u8; 32]), Signer::from_seed(&[2u8; 32]), rotate)
    }

    fn outcome(minted: u128, burned: u128) -> ApplyOutcome {
        ApplyOutcome {
            minted,
            burned,
            ..ApplyOutcome::default()
        }
    }

    #[test]
    fn empty_batch_produces_nothing() {
        let mut b = builder(true);
        assert!(b
            .produce(None, &[], &outcome(0, 0), None, Timestamp::new(1))
            .is_none());
        assert!(b.ephemeral_history().is_empty());
    }

    #[test]
    fn first_block_uses_zero_sentinel() {
        let mut b = builder(false);
        let block = b
            .produce(None, &[intent("a", IntentKind::Mint, 5)], &outcome(5, 0), None, Timestamp::new(1))
            .unwrap();
        assert_eq!(block.block_number, 1);
        assert_eq!(block.previous_block_hash.to_string(), "0".repeat(64));
        assert_eq!(block.minted_amount, 5);
        assert_eq!(recompute_block_hash(&block), block.block_hash);
        let treasury = b.treasury_public_key();
        assert!(verify_treasury_signature(&block.block_hash, &block.treasury_sig, &treasury));
    }

    #[test]
    fn second_block_links_to_first() {
        let mut b = builder(true);
        let first = b
            .produce(None, &[intent("a", IntentKind::Mint, 5)], &outcome(5, 0), None, Timestamp::new(1))
            .unwrap();
        let second = b
            .produce(Some(&first), &[intent("b", IntentKind::Burn, 2)], &outcome(0, 2), Some(b"{}".as_slice()), Timestamp::new(2))
            .unwrap();
        assert!(second.follows(&first));
        assert_ne!(first.ephemeral_pubkey, second.ephemeral_pubkey);
        assert_eq!(b.ephemeral_history().len(), 2);
    }

    #[test]
    fn fixed_ephemeral_key_gives_identical_hashes() {
        let batch = [intent("a", IntentKind::Mint, 5)];
        let one = builder(false)
            .produce(None, &batch, &outcome(5, 0), Some(b"x".as_slice()), Timestamp::new(1))
            .unwrap();
        let two = builder(false)
            .produce(None, &batch, &outcome(5, 0), Some(b"x".as_slice()), Timestamp::new(99))
            .unwrap();
        assert_eq!(one.block_hash, two.block_hash);
        assert_eq!(one.treasury_sig, two.treasury_sig);
    }
}
