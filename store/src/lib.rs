//! Abstract storage traits for the Coinvic ledger.
//!
//! Every storage backend (LMDB for production, in-memory for testing)
//! implements these traits. The rest of the codebase depends only on the
//! traits.
//!
//! Reads are fine-grained. The only write that touches balances is
//! [`LedgerStore::commit_block`], which persists a block together with
//! everything its application changed, or nothing at all.

pub mod account;
pub mod block;
pub mod commit;
pub mod entry;
pub mod error;
pub mod intent;
pub mod meta;

pub use account::AccountTable;
pub use block::BlockTable;
pub use commit::{check_next_block_number, BlockCommit, LedgerStore};
pub use entry::EntryTable;
pub use error::StoreError;
pub use intent::IntentTable;
pub use meta::AppDataStore;
