//! Intent queue storage trait.

use crate::StoreError;
use coinvic_types::{Intent, IntentId};

/// Durable queue of submitted intents.
///
/// Each insert is assigned a monotonically increasing admission sequence
/// number by the backend. It breaks ties between intents that share a
/// creation timestamp.
pub trait IntentTable {
    /// Append an unprocessed intent and record its transaction id. Fails with
    /// [`StoreError::Duplicate`] if the id was ever stored, including intents
    /// since removed by [`IntentTable::delete_processed`].
    fn insert_intent(&self, intent: &Intent) -> Result<u64, StoreError>;

    /// Whether a transaction id was ever admitted. Survives cleanup.
    fn transaction_seen(&self, id: &str) -> Result<bool, StoreError>;

    fn get_intent(&self, id: &str) -> Result<Option<Intent>, StoreError>;

    /// All unprocessed intents, ordered by creation timestamp ascending and
    /// then by admission sequence.
    fn unprocessed_intents(&self) -> Result<Vec<Intent>, StoreError>;

    /// Flag the given intents as processed outside a block commit. Unknown
    /// ids are ignored; already-processed ids are left as they are. Returns
    /// how many intents changed state.
    fn mark_processed(&self, ids: &[IntentId]) -> Result<usize, StoreError>;

    /// Delete every processed intent, returning how many were removed. The
    /// transaction ids stay recorded.
    fn delete_processed(&self) -> Result<usize, StoreError>;

    fn intent_count(&self) -> Result<u64, StoreError>;

    fn unprocessed_count(&self) -> Result<u64, StoreError> {
        self.unprocessed_intents().map(|v| v.len() as u64)
    }
}
