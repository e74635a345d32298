//! Cryptographic primitives for the Coinvic ledger.
//!
//! - **Ed25519** for intent signatures and block signing
//! - **SHA-256** for block hashes, intent batch hashes and app-data hashes
//! - [`Signer`], an owned, rotatable signing key holder
//! - Raw seed files for the long-lived treasury key

pub mod error;
pub mod hash;
pub mod keyfile;
pub mod keys;
pub mod sign;
pub mod signer;

pub use error::CryptoError;
pub use hash::{sha256, sha256_hash, sha256_hex, sha256_multi};
pub use keyfile::{load_or_create_seed, load_seed, save_seed};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
pub use signer::Signer;
