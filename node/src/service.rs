//! The node's request-facing operations.
//!
//! [`LedgerService`] ties intent admission and block production to metrics
//! and events, and is what the HTTP server routes to.

use std::sync::Arc;

use tracing::debug;

use coinvic_intents::{IntentError, IntentStore, ValidationPolicy};
use coinvic_rpc::{HealthReport, LedgerBackend, RpcError};
use coinvic_store::{LedgerStore, StoreError};
use coinvic_types::{Block, Intent, LedgerAccount};

use crate::ledger_event::LedgerEvent;
use crate::producer::{BlockProducer, CycleTrigger};
use crate::tracing_spans::intent_submit_span;
use crate::NodeError;

pub struct LedgerService<S> {
    store: Arc<S>,
    intents: IntentStore<S>,
    producer: BlockProducer<S>,
}

impl<S: LedgerStore> LedgerService<S> {
    pub fn new(store: Arc<S>, policy: ValidationPolicy, producer: BlockProducer<S>) -> Self {
        Self {
            intents: IntentStore::new(Arc::clone(&store), policy),
            store,
            producer,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn producer(&self) -> &BlockProducer<S> {
        &self.producer
    }

    pub fn intents(&self) -> &IntentStore<S> {
        &self.intents
    }

    /// Validate and queue an intent for the next block.
    pub fn submit(&self, intent: Intent) -> Result<(), NodeError> {
        let span = intent_submit_span(&intent.id, intent.kind.as_str());
        let _enter = span.enter();

        let id = intent.id.clone();
        let kind = intent.kind;
        let metrics = self.producer.metrics();
        let events = self.producer.events();

        match self.intents.submit(intent) {
            Ok(()) => {
                metrics.intents_submitted.inc();
                metrics.pending_intents.inc();
                events.emit(&LedgerEvent::IntentAccepted { id, kind });
                Ok(())
            }
            Err(IntentError::Validation(reason)) => {
                metrics.intents_rejected.inc();
                events.emit(&LedgerEvent::IntentRejected {
                    id,
                    reason: reason.to_string(),
                });
                Err(IntentError::Validation(reason).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run a production cycle now, outside the schedule.
    pub fn generate_block(&self) -> Result<Option<Block>, NodeError> {
        self.producer.run_cycle(CycleTrigger::Manual)
    }

    pub fn latest_block(&self) -> Result<Option<Block>, NodeError> {
        Ok(self.store.latest_block()?)
    }

    pub fn accounts(&self) -> Result<Vec<LedgerAccount>, NodeError> {
        Ok(self.store.iter_accounts()?)
    }

    pub fn app_data(&self) -> Result<Option<Vec<u8>>, NodeError> {
        Ok(self.store.get_app_data()?)
    }

    /// Replace the application-data snapshot hashed into the next block.
    pub fn put_app_data(&self, data: &[u8]) -> Result<(), NodeError> {
        self.store.put_app_data(data)?;
        debug!(bytes = data.len(), "app data snapshot replaced");
        Ok(())
    }

    pub fn health(&self) -> Result<HealthReport, NodeError> {
        let latest = self.store.latest_block()?;
        Ok(HealthReport {
            status: "ok".into(),
            chain_height: latest.as_ref().map_or(0, |b| b.block_number),
            latest_block_hash: latest.map(|b| b.block_hash),
            pending_intents: self.store.unprocessed_count()?,
            treasury_pubkey: self.producer.treasury_public_key(),
        })
    }
}

fn store_error(e: StoreError) -> RpcError {
    match e {
        StoreError::NotFound(key) => RpcError::NotFound(key),
        other => RpcError::Store(other.to_string()),
    }
}

impl From<NodeError> for RpcError {
    fn from(e: NodeError) -> Self {
        match e {
            NodeError::Intent(IntentError::Validation(reason)) => {
                RpcError::Rejected(reason.to_string())
            }
            NodeError::Intent(IntentError::Store(e)) | NodeError::Store(e) => store_error(e),
            NodeError::CycleInProgress => RpcError::CycleInProgress,
            other => RpcError::Server(other.to_string()),
        }
    }
}

impl<S: LedgerStore + 'static> LedgerBackend for LedgerService<S> {
    fn submit_intent(&self, intent: Intent) -> Result<(), RpcError> {
        Ok(self.submit(intent)?)
    }

    fn latest_block(&self) -> Result<Option<Block>, RpcError> {
        Ok(LedgerService::latest_block(self)?)
    }

    fn blocks(&self, from: u64, limit: usize) -> Result<Vec<Block>, RpcError> {
        self.store.blocks_range(from, limit).map_err(store_error)
    }

    fn master_ledger(&self) -> Result<Vec<LedgerAccount>, RpcError> {
        Ok(self.accounts()?)
    }

    fn app_data(&self) -> Result<Option<Vec<u8>>, RpcError> {
        Ok(LedgerService::app_data(self)?)
    }

    fn generate_block(&self) -> Result<Option<Block>, RpcError> {
        Ok(LedgerService::generate_block(self)?)
    }

    fn metrics_text(&self) -> Result<String, RpcError> {
        Ok(self.producer.metrics().encode_text()?)
    }

    fn health(&self) -> Result<HealthReport, RpcError> {
        Ok(LedgerService::health(self)?)
    }
}
