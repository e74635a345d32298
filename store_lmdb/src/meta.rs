//! LMDB implementation of AppDataStore, plus internal counters kept in the
//! `meta` database.

use heed::RwTxn;

use coinvic_store::{AppDataStore, StoreError};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

const APP_DATA_KEY: &[u8] = b"app_data";
const INTENT_SEQ_KEY: &[u8] = b"intent_seq";

/// Allocate the next admission sequence number inside `txn`.
pub(crate) fn next_intent_seq(
    env: &LmdbEnvironment,
    txn: &mut RwTxn<'_>,
) -> Result<u64, LmdbError> {
    let current = match env.meta_db.get(txn, INTENT_SEQ_KEY)? {
        Some(bytes) => {
            let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                LmdbError::Serialization(format!(
                    "intent_seq has {} bytes, expected 8",
                    bytes.len()
                ))
            })?;
            u64::from_be_bytes(arr)
        }
        None => 0,
    };
    let next = current + 1;
    env.meta_db.put(txn, INTENT_SEQ_KEY, &next.to_be_bytes())?;
    Ok(next)
}

impl AppDataStore for LmdbEnvironment {
    fn get_app_data(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, APP_DATA_KEY)
            .map_err(LmdbError::from)?;
        Ok(val.map(|v| v.to_vec()))
    }

    fn put_app_data(&self, data: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, APP_DATA_KEY, data)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
