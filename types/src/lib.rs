//! Fundamental types for the Coinvic ledger.
//!
//! This crate defines the data shared across every other crate in the workspace:
//! keys and signatures, SHA-256 digests, wallet identifiers, timestamps, and the
//! three persisted entities (intents, blocks, ledger accounts). Behaviour that
//! needs hashing or signing lives in `coinvic-crypto` and the crates above it.

pub mod account;
pub mod amount;
pub mod block;
pub mod error;
pub mod hash;
pub mod intent;
pub mod keys;
pub mod time;
pub mod wallet;

pub use account::{LedgerAccount, LedgerEntry};
pub use block::Block;
pub use error::ParseError;
pub use hash::Hash256;
pub use intent::{Intent, IntentId, IntentKind, IntentPayload, MintReason};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::Timestamp;
pub use wallet::WalletId;
