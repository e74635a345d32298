//! Intents: client-signed requests to move value on the ledger.
//!
//! - [`canonical`]: the exact bytes a client signs and the block commits to
//! - [`validation`]: stateless admission checks (shape, signature, authority)
//! - [`signing`]: helpers for building signed intents
//! - [`IntentStore`]: the admission queue in front of the durable intent table

pub mod canonical;
pub mod error;
pub mod signing;
pub mod store;
pub mod validation;

pub use canonical::{canonical_intent, signing_message};
pub use error::{IntentError, ValidationError};
pub use signing::sign_intent;
pub use store::IntentStore;
pub use validation::{validate_intent, ValidationPolicy};
