//! Periodic block production.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use coinvic_store::LedgerStore;

use crate::producer::CycleTrigger;
use crate::service::LedgerService;
use crate::NodeError;

/// Spawn a task that runs a production cycle every `period` until
/// `shutdown` fires.
///
/// Each cycle runs on the blocking pool and is awaited before the next tick,
/// so a shutdown signal lets the current cycle finish. Ticks that would
/// overlap a slow cycle are skipped.
pub fn spawn_block_scheduler<S: LedgerStore + 'static>(
    service: Arc<LedgerService<S>>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_secs = period.as_secs_f64(), "block scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("block scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let svc = Arc::clone(&service);
                    let result = tokio::task::spawn_blocking(move || {
                        svc.producer().run_cycle(CycleTrigger::Scheduled)
                    })
                    .await;
                    match result {
                        Ok(Ok(Some(block))) => {
                            debug!(block = block.block_number, "scheduled cycle produced a block");
                        }
                        Ok(Ok(None)) => {}
                        Ok(Err(NodeError::CycleInProgress)) => {
                            debug!("manual cycle running, skipping tick");
                        }
                        // Already logged and counted by the producer.
                        Ok(Err(_)) => {}
                        Err(e) => error!(error = %e, "production task panicked"),
                    }
                }
            }
        }
    })
}
