//! Application-data snapshot storage.

use crate::StoreError;

/// Holds the opaque application-data snapshot whose hash every block commits
/// to. The ledger never interprets these bytes.
pub trait AppDataStore {
    fn get_app_data(&self) -> Result<Option<Vec<u8>>, StoreError>;

    fn put_app_data(&self, data: &[u8]) -> Result<(), StoreError>;
}
