//! Master ledger and block assembly.
//!
//! A production cycle is two steps over the same batch of intents:
//! [`MasterLedger::apply`] stages the balance changes, then
//! [`BlockBuilder::produce`] seals the batch into a signed, hash-chained
//! block. Nothing here writes to storage; the caller commits the block and
//! the staged rows together.

pub mod builder;
pub mod error;
pub mod hashing;
pub mod master;
pub mod system;

pub use builder::BlockBuilder;
pub use error::LedgerError;
pub use hashing::{
    block_hash_input, compute_app_data_hash, compute_block_hash, compute_intents_hash,
    recompute_block_hash, verify_treasury_signature,
};
pub use master::{ApplyOutcome, BalanceDelta, MasterLedger, SkippedIntent};
pub use system::SystemAccounts;
