//! LMDB implementation of IntentTable.

use heed::RwTxn;
use serde::{Deserialize, Serialize};

use coinvic_store::{IntentTable, StoreError};
use coinvic_types::{Intent, IntentId};

use crate::environment::LmdbEnvironment;
use crate::meta::next_intent_seq;
use crate::LmdbError;

/// Row stored in the `intents` database.
#[derive(Serialize, Deserialize)]
pub(crate) struct StoredIntent {
    pub seq: u64,
    pub intent: Intent,
}

/// `created_at_be ++ seq_be`: sorts by creation time, then admission order.
pub(crate) fn pending_key(intent: &Intent, seq: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&intent.created_at.as_millis().to_be_bytes());
    key[8..].copy_from_slice(&seq.to_be_bytes());
    key
}

/// Flag `ids` as processed inside `txn`. Shared by the standalone
/// `mark_processed` and the block commit.
pub(crate) fn mark_processed_in(
    env: &LmdbEnvironment,
    txn: &mut RwTxn<'_>,
    ids: &[IntentId],
) -> Result<usize, LmdbError> {
    let mut changed = 0;
    for id in ids {
        let stored: Option<StoredIntent> = match env.intents_db.get(txn, id.as_bytes())? {
            Some(bytes) => Some(bincode::deserialize(bytes)?),
            None => None,
        };
        let Some(mut stored) = stored else {
            continue;
        };
        if stored.intent.processed {
            continue;
        }
        stored.intent.processed = true;
        let key = pending_key(&stored.intent, stored.seq);
        env.pending_db.delete(txn, &key[..])?;
        let bytes = bincode::serialize(&stored)?;
        env.intents_db.put(txn, id.as_bytes(), &bytes)?;
        changed += 1;
    }
    Ok(changed)
}

impl IntentTable for LmdbEnvironment {
    fn insert_intent(&self, intent: &Intent) -> Result<u64, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .tx_ids_db
            .get(&wtxn, intent.id.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!("intent {}", intent.id)));
        }

        let seq = next_intent_seq(self, &mut wtxn)?;
        self.tx_ids_db
            .put(&mut wtxn, intent.id.as_bytes(), &seq.to_be_bytes())
            .map_err(LmdbError::from)?;
        let stored = StoredIntent {
            seq,
            intent: intent.clone(),
        };
        let bytes = bincode::serialize(&stored).map_err(LmdbError::from)?;
        self.intents_db
            .put(&mut wtxn, intent.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        if !intent.processed {
            let key = pending_key(intent, seq);
            self.pending_db
                .put(&mut wtxn, &key[..], intent.id.as_bytes())
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(seq)
    }

    fn transaction_seen(&self, id: &str) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self
            .tx_ids_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .is_some())
    }

    fn get_intent(&self, id: &str) -> Result<Option<Intent>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let Some(bytes) = self
            .intents_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
        else {
            return Ok(None);
        };
        let stored: StoredIntent = bincode::deserialize(bytes).map_err(LmdbError::from)?;
        Ok(Some(stored.intent))
    }

    fn unprocessed_intents(&self) -> Result<Vec<Intent>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.pending_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut intents = Vec::new();
        for result in iter {
            let (_key, id) = result.map_err(LmdbError::from)?;
            let bytes = self
                .intents_db
                .get(&rtxn, id)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "pending index points at missing intent {}",
                        String::from_utf8_lossy(id)
                    ))
                })?;
            let stored: StoredIntent = bincode::deserialize(bytes).map_err(LmdbError::from)?;
            intents.push(stored.intent);
        }
        Ok(intents)
    }

    fn mark_processed(&self, ids: &[IntentId]) -> Result<usize, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let changed = mark_processed_in(self, &mut wtxn, ids)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(changed)
    }

    fn delete_processed(&self) -> Result<usize, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut processed_ids: Vec<Vec<u8>> = Vec::new();
        {
            let iter = self.intents_db.iter(&wtxn).map_err(LmdbError::from)?;
            for result in iter {
                let (key, bytes) = result.map_err(LmdbError::from)?;
                let stored: StoredIntent = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                if stored.intent.processed {
                    processed_ids.push(key.to_vec());
                }
            }
        }
        for key in &processed_ids {
            self.intents_db
                .delete(&mut wtxn, key.as_slice())
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(processed_ids.len())
    }

    fn intent_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.intents_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn unprocessed_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.pending_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
