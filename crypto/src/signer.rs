//! Owned, rotatable Ed25519 signer.
//!
//! A `Signer` holds at most one active key pair. Asking it for its public key
//! or a signature when it has none generates one first. Rotating replaces the
//! active pair and keeps the retired public key in the signer's history, so
//! blocks signed under an earlier key can still be attributed.

use coinvic_types::{KeyPair, PublicKey, Signature};
use tracing::debug;

use crate::keys::{generate_keypair, keypair_from_seed};
use crate::sign::{sign_message, verify_signature};

pub struct Signer {
    active: Option<KeyPair>,
    retired: Vec<PublicKey>,
}

impl Signer {
    /// A signer with no key yet. The first use generates one.
    pub fn new() -> Self {
        Self {
            active: None,
            retired: Vec::new(),
        }
    }

    pub fn from_keypair(keypair: KeyPair) -> Self {
        Self {
            active: Some(keypair),
            retired: Vec::new(),
        }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_keypair(keypair_from_seed(seed))
    }

    /// Replace the active key pair with a fresh one and return its public key.
    pub fn rotate(&mut self) -> PublicKey {
        let fresh = generate_keypair();
        let public = fresh.public;
        if let Some(old) = self.active.replace(fresh) {
            debug!(retired = %old.public, active = %public, "signer rotated");
            self.retired.push(old.public);
        }
        public
    }

    /// The active public key, generating a key pair if none exists.
    pub fn public_key(&mut self) -> PublicKey {
        self.active_pair().public
    }

    /// The active public key without initialising one.
    pub fn current_public_key(&self) -> Option<PublicKey> {
        self.active.as_ref().map(|kp| kp.public)
    }

    /// Sign exactly `message` with the active key, generating one if needed.
    pub fn sign(&mut self, message: &[u8]) -> Signature {
        sign_message(message, &self.active_pair().private)
    }

    /// Public keys retired by earlier rotations, oldest first.
    pub fn history(&self) -> &[PublicKey] {
        &self.retired
    }

    /// Check `signature` over `message` under `public_key`.
    pub fn verify(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
        verify_signature(message, signature, public_key)
    }

    fn active_pair(&mut self) -> &KeyPair {
        if self.active.is_none() {
            self.rotate();
        }
        self.active.get_or_insert_with(generate_keypair)
    }
}

impl Default for Signer {
    fn default() -> Self {
        Self::new()
    }
}
