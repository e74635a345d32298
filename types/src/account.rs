//! Ledger account and ledger entry records.

use serde::{Deserialize, Serialize};

use crate::intent::{IntentId, IntentKind};
use crate::time::Timestamp;
use crate::wallet::WalletId;

/// Balance row for one wallet in the master ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub wallet_pubkey: WalletId,
    #[serde(with = "crate::amount::decimal")]
    pub balance: u128,
    /// Height of the last block whose application touched this account.
    pub last_processed_block: u64,
}

impl LedgerAccount {
    pub fn empty(wallet: WalletId) -> Self {
        Self {
            wallet_pubkey: wallet,
            balance: 0,
            last_processed_block: 0,
        }
    }
}

/// Public record of one applied intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: IntentId,
    pub block_number: u64,
    pub timestamp: Timestamp,
    pub network: String,
    pub debit_wallet: Option<WalletId>,
    pub credit_wallet: Option<WalletId>,
    #[serde(with = "crate::amount::decimal")]
    pub amount: u128,
    pub intent_type: IntentKind,
    pub reason: Option<String>,
}
