//! Wallet identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::keys::PublicKey;

/// Identifies a ledger account.
///
/// User wallets are identified by the hex form of their Ed25519 public key.
/// System accounts (fee collection, staking rewards) use plain names such as
/// `tx_fee_wallet`; they never sign intents, so they need no key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The wallet identified by a public key.
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self(key.to_hex())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier is the hex form of `key`.
    pub fn is_owned_by(&self, key: &PublicKey) -> bool {
        self.0.eq_ignore_ascii_case(&key.to_hex())
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for WalletId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WalletId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_matches_hex_key_case_insensitively() {
        let key = PublicKey([0xAB; 32]);
        let upper = WalletId::new("AB".repeat(32));
        assert!(upper.is_owned_by(&key));
        assert!(!WalletId::new("tx_fee_wallet").is_owned_by(&key));
    }
}
