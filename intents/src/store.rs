//! The intent admission queue.

use std::sync::Arc;

use tracing::{debug, info, warn};

use coinvic_store::{AccountTable, IntentTable, StoreError};
use coinvic_types::{Intent, IntentId};

use crate::error::{IntentError, ValidationError};
use crate::validation::{validate_intent, ValidationPolicy};

/// Validates submitted intents and queues them in the durable intent table.
///
/// Submissions may run concurrently with block production: an intent
/// admitted while a cycle is running lands in the next batch.
pub struct IntentStore<S> {
    store: Arc<S>,
    policy: ValidationPolicy,
}

impl<S> IntentStore<S>
where
    S: IntentTable + AccountTable,
{
    pub fn new(store: Arc<S>, policy: ValidationPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Validate `intent` and append it unprocessed.
    ///
    /// The balance check for debits uses the committed balance at the time of
    /// submission; the ledger checks again when the intent is applied.
    pub fn submit(&self, mut intent: Intent) -> Result<(), IntentError> {
        let result = self.admit(&mut intent);
        match &result {
            Ok(seq) => info!(
                id = %intent.id,
                kind = %intent.kind,
                amount = %intent.payload.amount,
                seq,
                "intent accepted"
            ),
            Err(err) => warn!(id = %intent.id, kind = %intent.kind, %err, "intent rejected"),
        }
        result.map(|_| ())
    }

    fn admit(&self, intent: &mut Intent) -> Result<u64, IntentError> {
        intent.processed = false;
        validate_intent(intent, &self.policy)?;

        if self.store.transaction_seen(&intent.id)? {
            return Err(ValidationError::DuplicateTransaction(intent.id.clone()).into());
        }

        if let Some(wallet) = intent.debit_wallet() {
            let balance = self.store.balance_of(wallet)?;
            if balance < intent.payload.amount {
                return Err(ValidationError::InsufficientBalance {
                    wallet: wallet.to_string(),
                    balance,
                    amount: intent.payload.amount,
                }
                .into());
            }
        }

        // Two submitters can race past the existence check; the table's own
        // duplicate check decides.
        match self.store.insert_intent(intent) {
            Ok(seq) => Ok(seq),
            Err(StoreError::Duplicate(_)) => {
                Err(ValidationError::DuplicateTransaction(intent.id.clone()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Unprocessed intents in FIFO order (creation time, then admission).
    pub fn fetch_unprocessed(&self) -> Result<Vec<Intent>, IntentError> {
        Ok(self.store.unprocessed_intents()?)
    }

    /// Flag intents as processed. Idempotent; unknown ids are ignored.
    pub fn mark_processed(&self, ids: &[IntentId]) -> Result<usize, IntentError> {
        let changed = self.store.mark_processed(ids)?;
        debug!(requested = ids.len(), changed, "intents marked processed");
        Ok(changed)
    }

    /// Delete processed intents, returning how many were removed.
    pub fn cleanup_processed(&self) -> Result<usize, IntentError> {
        let removed = self.store.delete_processed()?;
        if removed > 0 {
            info!(removed, "processed intents cleaned up");
        }
        Ok(removed)
    }

    pub fn pending_count(&self) -> Result<u64, IntentError> {
        Ok(self.store.unprocessed_count()?)
    }
}
