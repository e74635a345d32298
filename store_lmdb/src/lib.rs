//! LMDB storage backend for the Coinvic ledger.
//!
//! Implements every storage trait from `coinvic-store` using the `heed` LMDB
//! bindings. All logical tables live in one environment, so a block commit is
//! a single LMDB write transaction.

pub mod account;
pub mod block;
pub mod entry;
pub mod environment;
pub mod error;
pub mod intent;
pub mod integrity;
pub mod meta;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use write_batch::WriteBatch;
