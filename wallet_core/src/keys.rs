//! Wallet key management and intent signing.

use std::path::Path;

use zeroize::Zeroizing;

use coinvic_crypto::{generate_keypair, keypair_from_seed, load_or_create_seed};
use coinvic_intents::{sign_intent, signing_message};
use coinvic_types::{
    Intent, IntentKind, IntentPayload, KeyPair, MintReason, PublicKey, Timestamp, WalletId,
};

use crate::error::WalletError;

/// A wallet's signing key. Its wallet id is the hex public key.
pub struct WalletKeys {
    keypair: KeyPair,
    network: String,
}

impl WalletKeys {
    pub fn generate(network: impl Into<String>) -> Self {
        Self {
            keypair: generate_keypair(),
            network: network.into(),
        }
    }

    pub fn from_seed(seed: &[u8; 32], network: impl Into<String>) -> Self {
        Self {
            keypair: keypair_from_seed(seed),
            network: network.into(),
        }
    }

    /// Load the seed file at `path`, creating one on first use.
    pub fn load_or_create(path: &Path, network: impl Into<String>) -> Result<Self, WalletError> {
        let seed = Zeroizing::new(load_or_create_seed(path)?);
        Ok(Self::from_seed(&seed, network))
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public
    }

    pub fn wallet_id(&self) -> WalletId {
        WalletId::from_public_key(&self.keypair.public)
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    fn payload(&self, amount: u128, transaction_id: String) -> IntentPayload {
        IntentPayload {
            wallet: None,
            from: None,
            to: None,
            amount,
            network: self.network.clone(),
            reason: None,
            transaction_id,
        }
    }

    fn sign(&self, kind: IntentKind, payload: IntentPayload) -> Result<Intent, WalletError> {
        if payload.amount == 0 {
            return Err(WalletError::InvalidIntent("amount must be positive".into()));
        }
        if payload.transaction_id.is_empty() {
            return Err(WalletError::InvalidIntent("transaction id is empty".into()));
        }
        Ok(sign_intent(kind, payload, &self.keypair, Timestamp::now()))
    }

    /// Transfer `amount` from this wallet to `to`.
    pub fn transfer(
        &self,
        to: WalletId,
        amount: u128,
        transaction_id: impl Into<String>,
    ) -> Result<Intent, WalletError> {
        let mut payload = self.payload(amount, transaction_id.into());
        payload.from = Some(self.wallet_id());
        payload.to = Some(to);
        self.sign(IntentKind::Transfer, payload)
    }

    /// Burn `amount` from this wallet.
    pub fn burn(&self, amount: u128, transaction_id: impl Into<String>) -> Result<Intent, WalletError> {
        let mut payload = self.payload(amount, transaction_id.into());
        payload.wallet = Some(self.wallet_id());
        self.sign(IntentKind::Burn, payload)
    }

    /// Pay a fee of `amount` from this wallet.
    pub fn fee(&self, amount: u128, transaction_id: impl Into<String>) -> Result<Intent, WalletError> {
        let mut payload = self.payload(amount, transaction_id.into());
        payload.wallet = Some(self.wallet_id());
        self.sign(IntentKind::Fee, payload)
    }

    /// Record a balance claim for this wallet. Moves no value.
    pub fn claim_balance(
        &self,
        amount: u128,
        transaction_id: impl Into<String>,
    ) -> Result<Intent, WalletError> {
        let mut payload = self.payload(amount, transaction_id.into());
        payload.wallet = Some(self.wallet_id());
        self.sign(IntentKind::ClaimBalance, payload)
    }

    /// Mint `amount` into `wallet`. Nodes with configured authorities only
    /// accept this from an authority key.
    pub fn mint(
        &self,
        wallet: WalletId,
        amount: u128,
        reason: MintReason,
        transaction_id: impl Into<String>,
    ) -> Result<Intent, WalletError> {
        let mut payload = self.payload(amount, transaction_id.into());
        payload.wallet = Some(wallet);
        payload.reason = Some(reason.as_str().to_string());
        self.sign(IntentKind::Mint, payload)
    }

    /// Award a staking reward of `amount` to `wallet`.
    pub fn stake(
        &self,
        wallet: WalletId,
        amount: u128,
        transaction_id: impl Into<String>,
    ) -> Result<Intent, WalletError> {
        let mut payload = self.payload(amount, transaction_id.into());
        payload.wallet = Some(wallet);
        self.sign(IntentKind::Stake, payload)
    }

    /// The exact bytes this wallet signs for a `kind` intent over `payload`.
    pub fn signing_bytes(kind: IntentKind, payload: &IntentPayload) -> Vec<u8> {
        signing_message(kind, payload)
    }
}
