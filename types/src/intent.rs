//! Intent types: client-submitted requests to move value on the ledger.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::keys::{PublicKey, Signature};
use crate::time::Timestamp;
use crate::wallet::WalletId;

/// Intent identifier. Always equal to the payload's `transaction_id`.
pub type IntentId = String;

/// The kind of value movement an intent requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Create new coins and credit `wallet`.
    Mint,
    /// Destroy coins held by `wallet`.
    Burn,
    /// Move coins from `from` to `to`.
    Transfer,
    /// Debit `wallet` into the fee-collection account.
    Fee,
    /// Pay a staking reward from the staking-reward account to `wallet`.
    Stake,
    /// Record a claim against `wallet` without moving value.
    ClaimBalance,
}

impl IntentKind {
    pub const ALL: [IntentKind; 6] = [
        IntentKind::Mint,
        IntentKind::Burn,
        IntentKind::Transfer,
        IntentKind::Fee,
        IntentKind::Stake,
        IntentKind::ClaimBalance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Mint => "mint",
            IntentKind::Burn => "burn",
            IntentKind::Transfer => "transfer",
            IntentKind::Fee => "fee",
            IntentKind::Stake => "stake",
            IntentKind::ClaimBalance => "claim_balance",
        }
    }

    /// Kinds that take value out of a user wallet and therefore must be
    /// signed by that wallet's key.
    pub fn is_debit(&self) -> bool {
        matches!(
            self,
            IntentKind::Burn | IntentKind::Transfer | IntentKind::Fee
        )
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParseError::UnknownIntentKind(s.to_string()))
    }
}

/// Accepted reasons for minting new coins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MintReason {
    OutsideDepositIntoLiquidityPool,
    ApplicationEngagementReward,
    AdvertisingRevenueGenerated,
    NewApplicationDataMined,
    UserTaskReward,
    UserPurchaseAppFeatures,
    UserCryptoStakeAward,
    UserCryptoSwapAward,
}

impl MintReason {
    pub const ALL: [MintReason; 8] = [
        MintReason::OutsideDepositIntoLiquidityPool,
        MintReason::ApplicationEngagementReward,
        MintReason::AdvertisingRevenueGenerated,
        MintReason::NewApplicationDataMined,
        MintReason::UserTaskReward,
        MintReason::UserPurchaseAppFeatures,
        MintReason::UserCryptoStakeAward,
        MintReason::UserCryptoSwapAward,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MintReason::OutsideDepositIntoLiquidityPool => "OutsideDepositIntoLiquidityPool",
            MintReason::ApplicationEngagementReward => "ApplicationEngagementReward",
            MintReason::AdvertisingRevenueGenerated => "AdvertisingRevenueGenerated",
            MintReason::NewApplicationDataMined => "NewApplicationDataMined",
            MintReason::UserTaskReward => "UserTaskReward",
            MintReason::UserPurchaseAppFeatures => "UserPurchaseAppFeatures",
            MintReason::UserCryptoStakeAward => "UserCryptoStakeAward",
            MintReason::UserCryptoSwapAward => "UserCryptoSwapAward",
        }
    }
}

impl FromStr for MintReason {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MintReason::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseError::UnknownMintReason(s.to_string()))
    }
}

/// The signed body of an intent.
///
/// Field order here is the canonical order: the signature covers the JSON
/// serialization of this struct exactly as declared. Absent optional fields
/// serialize as `null`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentPayload {
    /// Target wallet for mint, burn, fee, stake and claim_balance.
    #[serde(default)]
    pub wallet: Option<WalletId>,
    /// Source wallet for transfer.
    #[serde(default)]
    pub from: Option<WalletId>,
    /// Destination wallet for transfer.
    #[serde(default)]
    pub to: Option<WalletId>,
    #[serde(with = "crate::amount::decimal")]
    pub amount: u128,
    pub network: String,
    /// Mint reason code, or a free-form note for other kinds.
    #[serde(default)]
    pub reason: Option<String>,
    pub transaction_id: String,
}

/// A submitted intent as stored in the intent queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub id: IntentId,
    #[serde(rename = "type")]
    pub kind: IntentKind,
    pub payload: IntentPayload,
    pub signer_pub: PublicKey,
    pub signature: Signature,
    pub created_at: Timestamp,
    #[serde(default)]
    pub processed: bool,
}

impl Intent {
    /// The wallet this intent debits, if any.
    pub fn debit_wallet(&self) -> Option<&WalletId> {
        match self.kind {
            IntentKind::Transfer => self.payload.from.as_ref(),
            IntentKind::Burn | IntentKind::Fee => self.payload.wallet.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&IntentKind::ClaimBalance).unwrap();
        assert_eq!(json, "\"claim_balance\"");
        assert_eq!("claim_balance".parse::<IntentKind>().unwrap(), IntentKind::ClaimBalance);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(matches!(
            "airdrop".parse::<IntentKind>(),
            Err(ParseError::UnknownIntentKind(_))
        ));
    }

    #[test]
    fn every_mint_reason_parses_back() {
        for reason in MintReason::ALL {
            assert_eq!(reason.as_str().parse::<MintReason>().unwrap(), reason);
        }
        assert!("FreeMoney".parse::<MintReason>().is_err());
    }

    #[test]
    fn payload_field_order_is_stable() {
        let payload = IntentPayload {
            wallet: Some(WalletId::new("w1")),
            from: None,
            to: None,
            amount: 100,
            network: "main".into(),
            reason: Some("UserTaskReward".into()),
            transaction_id: "tx-1".into(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"wallet":"w1","from":null,"to":null,"amount":"100","network":"main","reason":"UserTaskReward","transaction_id":"tx-1"}"#
        );
    }
}
