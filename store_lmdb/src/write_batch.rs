//! Write batching: groups store operations into a single LMDB write
//! transaction.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! batch.put_block(&block)?;
//! batch.put_account(&account)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::RwTxn;
use tracing::debug;

use coinvic_store::{check_next_block_number, BlockCommit, LedgerStore, StoreError};
use coinvic_types::{Block, IntentId, LedgerAccount, LedgerEntry};

use crate::block::block_key;
use crate::entry::entry_key;
use crate::environment::LmdbEnvironment;
use crate::intent::mark_processed_in;
use crate::LmdbError;

pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.env.write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, env })
    }

    /// Number of the highest block visible to this batch.
    pub fn latest_block_number(&self) -> Result<Option<u64>, StoreError> {
        let last = self
            .env
            .blocks_db
            .last(&self.txn)
            .map_err(LmdbError::from)?;
        match last {
            Some((key, _)) => {
                let arr: [u8; 8] = key.try_into().map_err(|_| {
                    StoreError::Corruption(format!("block key has {} bytes", key.len()))
                })?;
                Ok(Some(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn put_block(&mut self, block: &Block) -> Result<(), StoreError> {
        let key = block_key(block.block_number);
        let bytes = bincode::serialize(block).map_err(LmdbError::from)?;
        self.env
            .blocks_db
            .put(&mut self.txn, &key[..], &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    pub fn put_account(&mut self, account: &LedgerAccount) -> Result<(), StoreError> {
        let bytes = bincode::serialize(account).map_err(LmdbError::from)?;
        self.env
            .accounts_db
            .put(&mut self.txn, account.wallet_pubkey.as_str().as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Store the entries of one block, keyed by their position in `entries`.
    pub fn put_entries(&mut self, block_number: u64, entries: &[LedgerEntry]) -> Result<(), StoreError> {
        for (index, entry) in entries.iter().enumerate() {
            let index = u32::try_from(index)
                .map_err(|_| StoreError::Backend("too many entries in one block".into()))?;
            let key = entry_key(block_number, index);
            let bytes = bincode::serialize(entry).map_err(LmdbError::from)?;
            self.env
                .entries_db
                .put(&mut self.txn, &key[..], &bytes)
                .map_err(LmdbError::from)?;
        }
        Ok(())
    }

    pub fn mark_processed(&mut self, ids: &[IntentId]) -> Result<usize, StoreError> {
        Ok(mark_processed_in(self.env, &mut self.txn, ids)?)
    }

    /// Commit all operations in this batch atomically.
    pub fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

impl LedgerStore for LmdbEnvironment {
    fn commit_block(&self, commit: &BlockCommit) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        check_next_block_number(batch.latest_block_number()?, commit.block.block_number)?;

        batch.put_block(&commit.block)?;
        for account in &commit.accounts {
            batch.put_account(account)?;
        }
        batch.put_entries(commit.block.block_number, &commit.entries)?;
        let flipped = batch.mark_processed(&commit.processed)?;
        batch.commit()?;

        debug!(
            block = commit.block.block_number,
            accounts = commit.accounts.len(),
            entries = commit.entries.len(),
            processed = flipped,
            "block committed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinvic_store::{AccountTable, BlockTable, EntryTable, IntentTable};
    use coinvic_types::{
        Hash256, Intent, IntentKind, IntentPayload, PublicKey, Signature, Timestamp, WalletId,
    };

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = LmdbEnvironment::open(dir.path(), 8, 10 * 1024 * 1024).expect("failed to open env");
        (dir, env)
    }

    fn intent(id: &str, created_at: u64) -> Intent {
        Intent {
            id: id.to_string(),
            kind: IntentKind::Mint,
            payload: IntentPayload {
                wallet: Some(WalletId::new("w1")),
                from: None,
                to: None,
                amount: 10,
                network: "main".into(),
                reason: Some("UserTaskReward".into()),
                transaction_id: id.to_string(),
            },
            signer_pub: PublicKey([1u8; 32]),
            signature: Signature([2u8; 64]),
            created_at: Timestamp::new(created_at),
            processed: false,
        }
    }

    fn block(number: u64) -> Block {
        Block {
            block_number: number,
            previous_block_hash: Hash256::ZERO,
            minted_amount: 10,
            burned_amount: 0,
            intents_hash: Hash256::new([3u8; 32]),
            app_data_hash: Hash256::new([4u8; 32]),
            ephemeral_pubkey: PublicKey([5u8; 32]),
            treasury_sig: Signature([6u8; 64]),
            block_hash: Hash256::new([number as u8; 32]),
            timestamp: Timestamp::new(1_000),
            intent_count: 1,
        }
    }

    fn commit_for(number: u64, ids: &[&str]) -> BlockCommit {
        BlockCommit {
            block: block(number),
            accounts: vec![LedgerAccount {
                wallet_pubkey: WalletId::new("w1"),
                balance: 10 * number as u128,
                last_processed_block: number,
            }],
            entries: ids
                .iter()
                .map(|id| LedgerEntry {
                    entry_id: id.to_string(),
                    block_number: number,
                    timestamp: Timestamp::new(1_000),
                    network: "main".into(),
                    debit_wallet: None,
                    credit_wallet: Some(WalletId::new("w1")),
                    amount: 10,
                    intent_type: IntentKind::Mint,
                    reason: None,
                })
                .collect(),
            processed: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn commit_block_writes_everything() {
        let (_dir, env) = temp_env();
        env.insert_intent(&intent("a", 5)).unwrap();

        env.commit_block(&commit_for(1, &["a"])).unwrap();

        assert_eq!(env.latest_block().unwrap().unwrap().block_number, 1);
        assert_eq!(env.balance_of(&WalletId::new("w1")).unwrap(), 10);
        assert_eq!(env.entries_for_block(1).unwrap().len(), 1);
        assert!(env.get_intent("a").unwrap().unwrap().processed);
        assert!(env.unprocessed_intents().unwrap().is_empty());
    }

    #[test]
    fn out_of_order_block_is_rejected_and_nothing_written() {
        let (_dir, env) = temp_env();
        env.insert_intent(&intent("a", 5)).unwrap();

        let err = env.commit_block(&commit_for(2, &["a"])).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(env.block_count().unwrap(), 0);
        assert_eq!(env.account_count().unwrap(), 0);
        assert_eq!(env.unprocessed_intents().unwrap().len(), 1);
    }

    #[test]
    fn dropped_batch_does_not_persist() {
        let (_dir, env) = temp_env();
        {
            let mut batch = env.write_batch().unwrap();
            batch.put_block(&block(1)).unwrap();
        }
        assert!(env.get_block(1).unwrap().is_none());
    }

    #[test]
    fn unprocessed_order_is_created_at_then_admission() {
        let (_dir, env) = temp_env();
        env.insert_intent(&intent("late", 300)).unwrap();
        env.insert_intent(&intent("tie-first", 100)).unwrap();
        env.insert_intent(&intent("tie-second", 100)).unwrap();
        env.insert_intent(&intent("early", 50)).unwrap();

        let ids: Vec<String> = env
            .unprocessed_intents()
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["early", "tie-first", "tie-second", "late"]);
    }

    #[test]
    fn duplicate_intent_id_is_rejected() {
        let (_dir, env) = temp_env();
        env.insert_intent(&intent("a", 1)).unwrap();
        assert!(matches!(
            env.insert_intent(&intent("a", 2)),
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(env.intent_count().unwrap(), 1);
    }

    #[test]
    fn mark_processed_is_idempotent_and_ignores_unknown() {
        let (_dir, env) = temp_env();
        env.insert_intent(&intent("a", 1)).unwrap();
        env.insert_intent(&intent("b", 2)).unwrap();

        let ids = vec!["a".to_string(), "ghost".to_string()];
        assert_eq!(env.mark_processed(&ids).unwrap(), 1);
        assert_eq!(env.mark_processed(&ids).unwrap(), 0);
        assert_eq!(env.unprocessed_count().unwrap(), 1);

        assert_eq!(env.delete_processed().unwrap(), 1);
        assert_eq!(env.intent_count().unwrap(), 1);
        assert!(env.get_intent("a").unwrap().is_none());
    }

    #[test]
    fn deleted_intent_id_stays_taken() {
        let (_dir, env) = temp_env();
        env.insert_intent(&intent("a", 1)).unwrap();
        env.commit_block(&commit_for(1, &["a"])).unwrap();
        assert_eq!(env.delete_processed().unwrap(), 1);

        assert!(env.transaction_seen("a").unwrap());
        assert!(!env.transaction_seen("b").unwrap());
        assert!(matches!(
            env.insert_intent(&intent("a", 2)),
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(env.intent_count().unwrap(), 0);
        assert_eq!(env.unprocessed_count().unwrap(), 0);
    }

    #[test]
    fn blocks_range_stops_at_tip() {
        let (_dir, env) = temp_env();
        for n in 1..=3 {
            env.commit_block(&commit_for(n, &[])).unwrap();
        }
        let blocks = env.blocks_range(2, 10).unwrap();
        assert_eq!(
            blocks.iter().map(|b| b.block_number).collect::<Vec<_>>(),
            vec![2, 3]
        );
    }
}
