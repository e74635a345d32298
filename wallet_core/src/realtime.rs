//! Background polling with change callbacks.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use coinvic_types::{Block, WalletId};

use crate::error::SyncError;
use crate::source::LedgerSource;
use crate::sync::{SyncOutcome, WalletSyncClient};

type BlockCallback = Box<dyn Fn(&Block) + Send + Sync>;
type BalanceCallback = Box<dyn Fn(&WalletId, u128) + Send + Sync>;
type AppDataCallback = Box<dyn Fn(&[u8]) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&SyncError) + Send + Sync>;

/// Optional hooks fired after each cycle.
#[derive(Default)]
pub struct SyncCallbacks {
    on_new_block: Option<BlockCallback>,
    on_balance_update: Option<BalanceCallback>,
    on_app_data_update: Option<AppDataCallback>,
    on_error: Option<ErrorCallback>,
}

impl SyncCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_new_block(mut self, f: impl Fn(&Block) + Send + Sync + 'static) -> Self {
        self.on_new_block = Some(Box::new(f));
        self
    }

    /// Called once per wallet whose balance changed.
    pub fn on_balance_update(mut self, f: impl Fn(&WalletId, u128) + Send + Sync + 'static) -> Self {
        self.on_balance_update = Some(Box::new(f));
        self
    }

    pub fn on_app_data_update(mut self, f: impl Fn(&[u8]) + Send + Sync + 'static) -> Self {
        self.on_app_data_update = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&SyncError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    fn dispatch<S: LedgerSource>(&self, client: &WalletSyncClient<S>, outcome: &SyncOutcome) {
        let SyncOutcome::Advanced(update) = outcome else {
            return;
        };
        if let Some(f) = &self.on_new_block {
            f(&update.block);
        }
        if let Some(f) = &self.on_balance_update {
            for (wallet, balance) in &update.balance_changes {
                f(wallet, *balance);
            }
        }
        if update.app_data_changed {
            if let Some(f) = &self.on_app_data_update {
                f(&client.state().app_data);
            }
        }
    }
}

/// A [`WalletSyncClient`] polling on its own task.
///
/// The stop signal is observed between cycles and while sleeping; a cycle
/// that has started always runs to completion. A block that fails
/// verification ends the task after `on_error` fires: the client is left
/// [`Stopped`](crate::SyncPhase::Stopped) on its last verified state.
pub struct RealtimeSync<S> {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<WalletSyncClient<S>>,
}

impl<S: LedgerSource + 'static> RealtimeSync<S> {
    pub fn start(mut client: WalletSyncClient<S>, callbacks: SyncCallbacks) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let interval = client.config().poll_interval();
            info!(
                node = %client.config().node_url,
                interval_ms = interval.as_millis() as u64,
                "realtime wallet sync started"
            );

            loop {
                if *stop_rx.borrow_and_update() {
                    break;
                }

                match client.sync_once().await {
                    Ok(outcome) => callbacks.dispatch(&client, &outcome),
                    Err(SyncError::Stopped) => break,
                    Err(e @ SyncError::Integrity(_)) => {
                        error!(error = %e, "node served an unverifiable block; sync halted");
                        if let Some(f) = &callbacks.on_error {
                            f(&e);
                        }
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "sync cycle failed");
                        if let Some(f) = &callbacks.on_error {
                            f(&e);
                        }
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    changed = stop_rx.changed() => {
                        if changed.is_err() {
                            debug!("sync handle dropped");
                            break;
                        }
                    }
                }
            }

            client.stop();
            info!(height = client.state().last_block_number, "realtime wallet sync stopped");
            client
        });
        Self { stop_tx, handle }
    }

    /// Ask the task to stop after the current cycle.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop and wait for the task, returning the client with its final state.
    pub async fn shutdown(self) -> Result<WalletSyncClient<S>, tokio::task::JoinError> {
        self.stop();
        self.handle.await
    }
}
