//! Wallet-side access to a Coinvic ledger.
//!
//! [`WalletSyncClient`] follows the chain from any [`LedgerSource`],
//! verifying each new block against a pinned treasury key before mirroring
//! the ledger; [`RealtimeSync`] runs it on a background task.
//! [`LedgerClient`] is the HTTP source and also submits intents signed with
//! [`WalletKeys`].

pub mod client;
pub mod config;
pub mod error;
pub mod keys;
pub mod realtime;
pub mod source;
pub mod sync;
pub mod verify;

pub use client::{GenerateBlockResult, LedgerClient, SubmitIntentResult};
pub use config::SyncConfig;
pub use error::{ChainIntegrityError, SyncError, WalletError};
pub use keys::WalletKeys;
pub use realtime::{RealtimeSync, SyncCallbacks};
pub use source::LedgerSource;
pub use sync::{SyncOutcome, SyncPhase, SyncUpdate, WalletSyncClient, WalletSyncState};
pub use verify::{verify_app_data, verify_block, VerifiedTip};
