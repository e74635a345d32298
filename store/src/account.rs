//! Master-ledger account storage trait.

use crate::StoreError;
use coinvic_types::{LedgerAccount, WalletId};

pub trait AccountTable {
    fn get_account(&self, wallet: &WalletId) -> Result<Option<LedgerAccount>, StoreError>;

    /// Every account row, ordered by wallet id.
    fn iter_accounts(&self) -> Result<Vec<LedgerAccount>, StoreError>;

    fn account_count(&self) -> Result<u64, StoreError>;

    /// Balance of `wallet`; wallets without a row hold zero.
    fn balance_of(&self, wallet: &WalletId) -> Result<u128, StoreError> {
        Ok(self.get_account(wallet)?.map(|a| a.balance).unwrap_or(0))
    }
}
