//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::{info, warn};

use coinvic_store::StoreError;

use crate::integrity::check_integrity;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Names of the databases inside the environment.
pub(crate) const DB_INTENTS: &str = "intents";
pub(crate) const DB_PENDING: &str = "pending_intents";
pub(crate) const DB_TX_IDS: &str = "tx_ids";
pub(crate) const DB_BLOCKS: &str = "blocks";
pub(crate) const DB_ACCOUNTS: &str = "accounts";
pub(crate) const DB_ENTRIES: &str = "entries";
pub(crate) const DB_META: &str = "meta";

/// Wraps the LMDB environment and all database handles.
///
/// Layout:
/// - `intents`: intent id → bincode `StoredIntent` (admission seq + intent)
/// - `pending_intents`: `created_at_be(8) ++ seq_be(8)` → intent id, one row
///   per unprocessed intent, so a forward scan yields FIFO order
/// - `tx_ids`: transaction id → admission `seq_be(8)`, never pruned
/// - `blocks`: `block_number_be(8)` → bincode `Block`
/// - `accounts`: wallet id → bincode `LedgerAccount`
/// - `entries`: `block_number_be(8) ++ index_be(4)` → bincode `LedgerEntry`
/// - `meta`: app-data snapshot and the admission counter
pub struct LmdbEnvironment {
    pub(crate) env: Arc<Env>,
    pub(crate) intents_db: Database<Bytes, Bytes>,
    pub(crate) pending_db: Database<Bytes, Bytes>,
    pub(crate) tx_ids_db: Database<Bytes, Bytes>,
    pub(crate) blocks_db: Database<Bytes, Bytes>,
    pub(crate) accounts_db: Database<Bytes, Bytes>,
    pub(crate) entries_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path and
        // the memory map is never accessed outside heed.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let intents_db = env.create_database(&mut wtxn, Some(DB_INTENTS))?;
        let pending_db = env.create_database(&mut wtxn, Some(DB_PENDING))?;
        let tx_ids_db = env.create_database(&mut wtxn, Some(DB_TX_IDS))?;
        let blocks_db = env.create_database(&mut wtxn, Some(DB_BLOCKS))?;
        let accounts_db = env.create_database(&mut wtxn, Some(DB_ACCOUNTS))?;
        let entries_db = env.create_database(&mut wtxn, Some(DB_ENTRIES))?;
        let meta_db = env.create_database(&mut wtxn, Some(DB_META))?;
        wtxn.commit()?;

        let env = Arc::new(env);
        let report = check_integrity(&env)?;
        if report.is_healthy() {
            info!(
                path = %path.display(),
                databases = report.databases_checked,
                entries = report.total_entries,
                "LMDB environment opened"
            );
        } else {
            for error in &report.errors {
                warn!(path = %path.display(), %error, "LMDB integrity problem");
            }
        }

        Ok(Self {
            env,
            intents_db,
            pending_db,
            tx_ids_db,
            blocks_db,
            accounts_db,
            entries_db,
            meta_db,
        })
    }

    /// Begin a write batch spanning every table.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, StoreError> {
        WriteBatch::new(self)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }
}
