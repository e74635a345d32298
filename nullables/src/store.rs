//! Nullable store: thread-safe in-memory ledger storage for testing.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use coinvic_store::{
    check_next_block_number, AccountTable, AppDataStore, BlockCommit, BlockTable, EntryTable,
    IntentTable, LedgerStore, StoreError,
};
use coinvic_types::{Block, Intent, IntentId, LedgerAccount, LedgerEntry, WalletId};

#[derive(Default)]
struct Inner {
    intents: HashMap<IntentId, (u64, Intent)>,
    tx_ids: HashSet<IntentId>,
    next_seq: u64,
    blocks: BTreeMap<u64, Block>,
    accounts: BTreeMap<WalletId, LedgerAccount>,
    entries: BTreeMap<(u64, u32), LedgerEntry>,
    app_data: Option<Vec<u8>>,
}

/// An in-memory implementation of every ledger table.
///
/// One mutex guards all tables, so `commit_block` is atomic with respect to
/// every reader. Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    inner: Mutex<Inner>,
    fail_next_commit: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// Make the next `commit_block` fail with a backend error without
    /// writing anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Seed an account row directly, bypassing block production.
    pub fn put_account(&self, account: LedgerAccount) {
        self.inner
            .lock()
            .unwrap()
            .accounts
            .insert(account.wallet_pubkey.clone(), account);
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

fn flip_processed(inner: &mut Inner, ids: &[IntentId]) -> usize {
    let mut changed = 0;
    for id in ids {
        if let Some((_, intent)) = inner.intents.get_mut(id) {
            if !intent.processed {
                intent.processed = true;
                changed += 1;
            }
        }
    }
    changed
}

impl IntentTable for NullStore {
    fn insert_intent(&self, intent: &Intent) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.tx_ids.insert(intent.id.clone()) {
            return Err(StoreError::Duplicate(format!("intent {}", intent.id)));
        }
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner.intents.insert(intent.id.clone(), (seq, intent.clone()));
        Ok(seq)
    }

    fn transaction_seen(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.lock().unwrap().tx_ids.contains(id))
    }

    fn get_intent(&self, id: &str) -> Result<Option<Intent>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .intents
            .get(id)
            .map(|(_, i)| i.clone()))
    }

    fn unprocessed_intents(&self) -> Result<Vec<Intent>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut pending: Vec<&(u64, Intent)> = inner
            .intents
            .values()
            .filter(|(_, i)| !i.processed)
            .collect();
        pending.sort_by_key(|(seq, i)| (i.created_at, *seq));
        Ok(pending.into_iter().map(|(_, i)| i.clone()).collect())
    }

    fn mark_processed(&self, ids: &[IntentId]) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(flip_processed(&mut inner, ids))
    }

    fn delete_processed(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.intents.len();
        inner.intents.retain(|_, (_, i)| !i.processed);
        Ok(before - inner.intents.len())
    }

    fn intent_count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().intents.len() as u64)
    }
}

impl BlockTable for NullStore {
    fn get_block(&self, block_number: u64) -> Result<Option<Block>, StoreError> {
        Ok(self.inner.lock().unwrap().blocks.get(&block_number).cloned())
    }

    fn latest_block(&self) -> Result<Option<Block>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .blocks
            .last_key_value()
            .map(|(_, b)| b.clone()))
    }

    fn block_count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().blocks.len() as u64)
    }

    fn blocks_range(&self, from: u64, limit: usize) -> Result<Vec<Block>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .blocks
            .range(from..)
            .take(limit)
            .map(|(_, b)| b.clone())
            .collect())
    }
}

impl AccountTable for NullStore {
    fn get_account(&self, wallet: &WalletId) -> Result<Option<LedgerAccount>, StoreError> {
        Ok(self.inner.lock().unwrap().accounts.get(wallet).cloned())
    }

    fn iter_accounts(&self) -> Result<Vec<LedgerAccount>, StoreError> {
        Ok(self.inner.lock().unwrap().accounts.values().cloned().collect())
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().accounts.len() as u64)
    }
}

impl EntryTable for NullStore {
    fn entries_for_block(&self, block_number: u64) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .entries
            .range((block_number, 0)..(block_number + 1, 0))
            .map(|(_, e)| e.clone())
            .collect())
    }

    fn entry_count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().entries.len() as u64)
    }
}

impl AppDataStore for NullStore {
    fn get_app_data(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.lock().unwrap().app_data.clone())
    }

    fn put_app_data(&self, data: &[u8]) -> Result<(), StoreError> {
        self.inner.lock().unwrap().app_data = Some(data.to_vec());
        Ok(())
    }
}

impl LedgerStore for NullStore {
    fn commit_block(&self, commit: &BlockCommit) -> Result<(), StoreError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        let mut inner = self.inner.lock().unwrap();
        let latest = inner.blocks.last_key_value().map(|(n, _)| *n);
        check_next_block_number(latest, commit.block.block_number)?;

        let number = commit.block.block_number;
        inner.blocks.insert(number, commit.block.clone());
        for account in &commit.accounts {
            inner
                .accounts
                .insert(account.wallet_pubkey.clone(), account.clone());
        }
        for (index, entry) in commit.entries.iter().enumerate() {
            inner.entries.insert((number, index as u32), entry.clone());
        }
        flip_processed(&mut inner, &commit.processed);
        Ok(())
    }
}
