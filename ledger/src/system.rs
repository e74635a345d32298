//! System accounts that intents move value into or out of.

use coinvic_types::WalletId;
use serde::{Deserialize, Serialize};

/// Names of the ledger-owned accounts. Fee intents credit `fee_collection`;
/// stake intents pay out of `staking_reward`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemAccounts {
    pub fee_collection: WalletId,
    pub staking_reward: WalletId,
}

impl Default for SystemAccounts {
    fn default() -> Self {
        Self {
            fee_collection: WalletId::new("tx_fee_wallet"),
            staking_reward: WalletId::new("staking_reward_wallet"),
        }
    }
}
