//! LMDB implementation of AccountTable.

use coinvic_store::{AccountTable, StoreError};
use coinvic_types::{LedgerAccount, WalletId};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

impl AccountTable for LmdbEnvironment {
    fn get_account(&self, wallet: &WalletId) -> Result<Option<LedgerAccount>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .accounts_db
            .get(&rtxn, wallet.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn iter_accounts(&self) -> Result<Vec<LedgerAccount>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.accounts_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut accounts = Vec::new();
        for result in iter {
            let (_key, bytes) = result.map_err(LmdbError::from)?;
            accounts.push(bincode::deserialize(bytes).map_err(LmdbError::from)?);
        }
        Ok(accounts)
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.accounts_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
