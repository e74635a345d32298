//! Events emitted by intent admission and block production.

use coinvic_types::{Hash256, IntentKind};

/// Ledger-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    /// An intent passed validation and was queued.
    IntentAccepted { id: String, kind: IntentKind },
    /// An intent was refused at submission and not stored.
    IntentRejected { id: String, reason: String },
    /// An intent was consumed by a block without moving value.
    IntentSkipped {
        id: String,
        kind: IntentKind,
        block_number: u64,
        reason: String,
    },
    /// A block was committed together with its ledger changes.
    BlockProduced {
        block_number: u64,
        block_hash: Hash256,
        applied: usize,
        skipped: usize,
    },
}

/// Synchronous fan-out event bus for ledger events.
///
/// Listeners run inline on the emitting thread, inside the production cycle;
/// keep handlers fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&LedgerEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &LedgerEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));
        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&LedgerEvent::IntentAccepted {
            id: "tx-1".into(),
            kind: IntentKind::Mint,
        });
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn listeners_see_events_in_emission_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = Arc::clone(&seen);
        bus.subscribe(Box::new(move |e| sink.lock().unwrap().push(e.clone())));

        let skipped = LedgerEvent::IntentSkipped {
            id: "tx-2".into(),
            kind: IntentKind::Burn,
            block_number: 4,
            reason: "insufficient balance".into(),
        };
        let produced = LedgerEvent::BlockProduced {
            block_number: 4,
            block_hash: Hash256::ZERO,
            applied: 0,
            skipped: 1,
        };
        bus.emit(&skipped);
        bus.emit(&produced);
        assert_eq!(*seen.lock().unwrap(), vec![skipped, produced]);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(&LedgerEvent::IntentRejected {
            id: "tx-3".into(),
            reason: "bad signature".into(),
        });
        assert_eq!(bus.listener_count(), 0);
    }
}
