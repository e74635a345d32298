//! The block production cycle.
//!
//! One cycle reads every unprocessed intent, stages its application on the
//! master ledger, seals the batch into a signed block and commits the block,
//! the touched accounts, the ledger entries and the processed flags in one
//! store transaction. If anything fails before the commit, nothing changes:
//! the intents stay unprocessed and are picked up by the next cycle.

use std::sync::{Arc, Mutex, TryLockError};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use coinvic_ledger::{ApplyOutcome, BlockBuilder, MasterLedger, SystemAccounts};
use coinvic_nullables::Clock;
use coinvic_store::{BlockCommit, LedgerStore};
use coinvic_types::{Block, PublicKey};

use crate::ledger_event::{EventBus, LedgerEvent};
use crate::metrics::NodeMetrics;
use crate::tracing_spans::production_cycle_span;
use crate::NodeError;

/// What started a production cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleTrigger {
    Scheduled,
    Manual,
}

impl CycleTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleTrigger::Scheduled => "scheduled",
            CycleTrigger::Manual => "manual",
        }
    }
}

/// Runs production cycles against a [`LedgerStore`].
///
/// The [`BlockBuilder`] sits behind a single-flight lock: a cycle triggered
/// while another one holds it fails fast with [`NodeError::CycleInProgress`]
/// instead of queueing.
pub struct BlockProducer<S> {
    store: Arc<S>,
    ledger: MasterLedger<S>,
    builder: Mutex<BlockBuilder>,
    treasury_key: PublicKey,
    clock: Arc<dyn Clock>,
    metrics: Arc<NodeMetrics>,
    events: Arc<EventBus>,
    prune_processed: bool,
}

impl<S: LedgerStore> BlockProducer<S> {
    pub fn new(
        store: Arc<S>,
        system: SystemAccounts,
        mut builder: BlockBuilder,
        clock: Arc<dyn Clock>,
        metrics: Arc<NodeMetrics>,
        events: Arc<EventBus>,
    ) -> Self {
        let treasury_key = builder.treasury_public_key();
        Self {
            ledger: MasterLedger::new(Arc::clone(&store), system),
            store,
            builder: Mutex::new(builder),
            treasury_key,
            clock,
            metrics,
            events,
            prune_processed: false,
        }
    }

    /// Delete processed intents after every committed block.
    pub fn with_pruning(mut self, prune: bool) -> Self {
        self.prune_processed = prune;
        self
    }

    /// The key every block's `treasury_sig` verifies against.
    pub fn treasury_public_key(&self) -> PublicKey {
        self.treasury_key
    }

    pub fn ledger(&self) -> &MasterLedger<S> {
        &self.ledger
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Run one production cycle.
    ///
    /// Returns `Ok(None)` when there was nothing to process. Blocking: call
    /// from `spawn_blocking` inside async code.
    pub fn run_cycle(&self, trigger: CycleTrigger) -> Result<Option<Block>, NodeError> {
        let mut builder = match self.builder.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                debug!(trigger = trigger.as_str(), "production cycle already running");
                return Err(NodeError::CycleInProgress);
            }
            // A panicked cycle committed nothing; the signers are still usable.
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let span = production_cycle_span(trigger.as_str());
        let _enter = span.enter();
        let started = Instant::now();

        let result = self.cycle(&mut builder, &span);

        self.metrics
            .cycle_duration_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);
        if let Err(e) = &result {
            self.metrics.cycles_failed.inc();
            error!(error = %e, "production cycle aborted, nothing committed");
        }
        self.refresh_pending_gauge();
        result
    }

    fn cycle(
        &self,
        builder: &mut BlockBuilder,
        span: &tracing::Span,
    ) -> Result<Option<Block>, NodeError> {
        let intents = self.store.unprocessed_intents()?;
        if intents.is_empty() {
            debug!("no unprocessed intents");
            return Ok(None);
        }

        let previous = self.store.latest_block()?;
        let block_number = previous.as_ref().map_or(1, |b| b.block_number + 1);
        span.record("block", block_number);
        span.record("intents", intents.len());

        let outcome = self.ledger.apply(&intents, block_number)?;
        let app_data = self.store.get_app_data()?;

        let Some(block) = builder.produce(
            previous.as_ref(),
            &intents,
            &outcome,
            app_data.as_deref(),
            self.clock.now(),
        ) else {
            return Ok(None);
        };

        let ApplyOutcome {
            accounts,
            entries,
            applied,
            skipped,
            consumed,
            ..
        } = outcome;

        self.store.commit_block(&BlockCommit {
            block: block.clone(),
            accounts,
            entries,
            processed: consumed,
        })?;

        self.metrics.blocks_produced.inc();
        self.metrics.intents_applied.inc_by(applied.len() as u64);
        self.metrics.intents_skipped.inc_by(skipped.len() as u64);
        self.metrics
            .chain_height
            .set(i64::try_from(block.block_number).unwrap_or(i64::MAX));
        if let Ok(count) = self.store.account_count() {
            self.metrics
                .account_count
                .set(i64::try_from(count).unwrap_or(i64::MAX));
        }

        for skip in &skipped {
            self.events.emit(&LedgerEvent::IntentSkipped {
                id: skip.id.clone(),
                kind: skip.kind,
                block_number: block.block_number,
                reason: skip.reason.to_string(),
            });
        }
        self.events.emit(&LedgerEvent::BlockProduced {
            block_number: block.block_number,
            block_hash: block.block_hash,
            applied: applied.len(),
            skipped: skipped.len(),
        });

        info!(
            block = block.block_number,
            hash = %block.block_hash,
            applied = applied.len(),
            skipped = skipped.len(),
            "block committed"
        );

        if self.prune_processed {
            // The block is already durable; a failed cleanup is retried after
            // the next block.
            match self.store.delete_processed() {
                Ok(removed) => debug!(removed, "processed intents pruned"),
                Err(e) => warn!(error = %e, "failed to prune processed intents"),
            }
        }

        Ok(Some(block))
    }

    fn refresh_pending_gauge(&self) {
        match self.store.unprocessed_count() {
            Ok(n) => self
                .metrics
                .pending_intents
                .set(i64::try_from(n).unwrap_or(i64::MAX)),
            Err(e) => warn!(error = %e, "failed to count pending intents"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinvic_crypto::{generate_keypair, Signer};
    use coinvic_intents::sign_intent;
    use coinvic_nullables::{NullClock, NullStore};
    use coinvic_store::{AccountTable, BlockTable, IntentTable};
    use coinvic_types::{IntentKind, IntentPayload, Timestamp, WalletId};

    fn producer(store: Arc<NullStore>) -> BlockProducer<NullStore> {
        let builder = BlockBuilder::new(Signer::new(), Signer::new(), true);
        BlockProducer::new(
            store,
            SystemAccounts::default(),
            builder,
            Arc::new(NullClock::new(5_000)),
            Arc::new(NodeMetrics::new().unwrap()),
            Arc::new(EventBus::new()),
        )
    }

    fn mint(store: &NullStore, tx: &str, wallet: &WalletId, amount: u128, at: u64) {
        let payload = IntentPayload {
            wallet: Some(wallet.clone()),
            from: None,
            to: None,
            amount,
            network: "main".into(),
            reason: Some("UserTaskReward".into()),
            transaction_id: tx.into(),
        };
        let intent = sign_intent(
            IntentKind::Mint,
            payload,
            &generate_keypair(),
            Timestamp::new(at),
        );
        store.insert_intent(&intent).unwrap();
    }

    #[test]
    fn empty_queue_produces_nothing() {
        let store = Arc::new(NullStore::new());
        let producer = producer(Arc::clone(&store));
        assert!(producer.run_cycle(CycleTrigger::Manual).unwrap().is_none());
        assert_eq!(store.block_count().unwrap(), 0);
    }

    #[test]
    fn cycle_commits_block_and_balances() {
        let store = Arc::new(NullStore::new());
        let producer = producer(Arc::clone(&store));
        let w1 = WalletId::new("w1");
        mint(&store, "tx-1", &w1, 100, 1);

        let block = producer.run_cycle(CycleTrigger::Manual).unwrap().unwrap();
        assert_eq!(block.block_number, 1);
        assert_eq!(block.minted_amount, 100);
        assert_eq!(store.balance_of(&w1).unwrap(), 100);
        assert_eq!(store.unprocessed_count().unwrap(), 0);
        assert_eq!(producer.metrics().blocks_produced.get(), 1);
        assert_eq!(producer.metrics().chain_height.get(), 1);
        assert_eq!(block.timestamp, Timestamp::new(5_000));
    }

    #[test]
    fn failed_commit_leaves_everything_unchanged() {
        let store = Arc::new(NullStore::new());
        let producer = producer(Arc::clone(&store));
        let w1 = WalletId::new("w1");
        mint(&store, "tx-1", &w1, 100, 1);

        store.fail_next_commit();
        assert!(matches!(
            producer.run_cycle(CycleTrigger::Scheduled),
            Err(NodeError::Store(_))
        ));
        assert_eq!(store.balance_of(&w1).unwrap(), 0);
        assert_eq!(store.unprocessed_count().unwrap(), 1);
        assert_eq!(producer.metrics().cycles_failed.get(), 1);

        let block = producer.run_cycle(CycleTrigger::Scheduled).unwrap().unwrap();
        assert_eq!(block.block_number, 1);
        assert_eq!(store.balance_of(&w1).unwrap(), 100);
    }

    #[test]
    fn second_trigger_while_locked_is_rejected() {
        let store = Arc::new(NullStore::new());
        let producer = producer(Arc::clone(&store));
        let _held = producer.builder.lock().unwrap();
        assert!(matches!(
            producer.run_cycle(CycleTrigger::Manual),
            Err(NodeError::CycleInProgress)
        ));
    }

    #[test]
    fn pruning_removes_processed_intents() {
        let store = Arc::new(NullStore::new());
        let producer = producer(Arc::clone(&store)).with_pruning(true);
        mint(&store, "tx-1", &WalletId::new("w1"), 5, 1);
        producer.run_cycle(CycleTrigger::Manual).unwrap();
        assert_eq!(store.intent_count().unwrap(), 0);
    }
}
