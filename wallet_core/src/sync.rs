//! Mirroring the master ledger into a wallet.
//!
//! A cycle walks `Idle → Polling → Verifying → Applying → Idle`:
//!
//! - **Polling** fetches the latest block. Nothing newer than the local tip
//!   ends the cycle without error.
//! - **Verifying** checks the block hash, the treasury signature against the
//!   pinned key, and the link onto the last verified block.
//! - **Applying** fetches the ledger and app-data snapshots and replaces the
//!   local mirror.
//!
//! Snapshot contents are trusted as served: the balances are not replayed
//! against `intents_hash`, and app data is only checked against
//! `app_data_hash` when `strict_app_data` is set. A failing cycle leaves
//! the state exactly as it was.

use std::collections::BTreeMap;
use std::future::Future;

use tracing::{debug, field, info, info_span, warn, Instrument};

use coinvic_types::{Block, Hash256, WalletId};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::source::LedgerSource;
use crate::verify::{verify_app_data, verify_block, VerifiedTip};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Polling,
    Verifying,
    Applying,
    Stopped,
}

/// What the wallet currently believes about the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSyncState {
    /// 0 until the first block is accepted.
    pub last_block_number: u64,
    pub last_block_hash: Option<Hash256>,
    pub balances: BTreeMap<WalletId, u128>,
    pub app_data: Vec<u8>,
}

impl WalletSyncState {
    pub fn balance(&self, wallet: &WalletId) -> u128 {
        self.balances.get(wallet).copied().unwrap_or(0)
    }

    pub fn tip(&self) -> Option<VerifiedTip> {
        self.last_block_hash.map(|block_hash| VerifiedTip {
            block_number: self.last_block_number,
            block_hash,
        })
    }

    /// The app-data snapshot parsed as JSON, if it parses.
    pub fn app_data_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.app_data).ok()
    }
}

/// Changes made by one successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncUpdate {
    pub block: Block,
    pub previous_height: u64,
    /// Wallets whose balance differs from the previous mirror, with the new
    /// balance.
    pub balance_changes: Vec<(WalletId, u128)>,
    pub app_data_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The source had nothing newer than `height`.
    UpToDate { height: u64 },
    Advanced(SyncUpdate),
}

pub struct WalletSyncClient<S> {
    source: S,
    config: SyncConfig,
    state: WalletSyncState,
    phase: SyncPhase,
}

impl<S: LedgerSource> WalletSyncClient<S> {
    pub fn new(source: S, config: SyncConfig) -> Self {
        Self::with_state(source, config, WalletSyncState::default())
    }

    /// Resume from a previously saved state.
    pub fn with_state(source: S, config: SyncConfig, state: WalletSyncState) -> Self {
        Self {
            source,
            config,
            state,
            phase: SyncPhase::Idle,
        }
    }

    pub fn state(&self) -> &WalletSyncState {
        &self.state
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn balance(&self, wallet: &WalletId) -> u128 {
        self.state.balance(wallet)
    }

    /// Refuse any further cycles.
    pub fn stop(&mut self) {
        self.phase = SyncPhase::Stopped;
    }

    /// Run one poll/verify/apply cycle.
    pub async fn sync_once(&mut self) -> Result<SyncOutcome, SyncError> {
        if self.phase == SyncPhase::Stopped {
            return Err(SyncError::Stopped);
        }
        let span = info_span!(
            "sync_cycle",
            height = self.state.last_block_number,
            block = field::Empty,
        );
        let result = self.cycle().instrument(span).await;
        if self.phase != SyncPhase::Stopped {
            self.phase = SyncPhase::Idle;
        }
        result
    }

    async fn cycle(&mut self) -> Result<SyncOutcome, SyncError> {
        self.phase = SyncPhase::Polling;
        let latest = with_retry(&self.source, &self.config, "latest block", |s| {
            s.latest_block()
        })
        .await?;

        let block = match latest {
            Some(block) if block.block_number > self.state.last_block_number => block,
            _ => {
                debug!("no new block");
                return Ok(SyncOutcome::UpToDate {
                    height: self.state.last_block_number,
                });
            }
        };
        tracing::Span::current().record("block", block.block_number);

        self.phase = SyncPhase::Verifying;
        let tip = self.state.tip();
        if let Err(e) = verify_block(&block, &self.config.treasury_pubkey, tip.as_ref()) {
            warn!(error = %e, "block failed verification");
            return Err(e.into());
        }

        self.phase = SyncPhase::Applying;
        let accounts = with_retry(&self.source, &self.config, "ledger snapshot", |s| {
            s.ledger_snapshot()
        })
        .await?;
        let app_data = with_retry(&self.source, &self.config, "app data", |s| {
            s.app_data_snapshot()
        })
        .await?;

        if self.config.strict_app_data {
            if let Err(e) = verify_app_data(&block, &app_data) {
                warn!(error = %e, "app data snapshot failed verification");
                return Err(e.into());
            }
        }

        let balances: BTreeMap<WalletId, u128> = accounts
            .into_iter()
            .map(|a| (a.wallet_pubkey, a.balance))
            .collect();
        let balance_changes = balances
            .iter()
            .filter(|(wallet, balance)| self.state.balances.get(*wallet) != Some(*balance))
            .map(|(wallet, balance)| (wallet.clone(), *balance))
            .collect();
        let app_data_changed = app_data != self.state.app_data;
        let previous_height = self.state.last_block_number;

        self.state = WalletSyncState {
            last_block_number: block.block_number,
            last_block_hash: Some(block.block_hash),
            balances,
            app_data,
        };

        info!(
            block = block.block_number,
            hash = %block.block_hash,
            accounts = self.state.balances.len(),
            "wallet synced"
        );

        Ok(SyncOutcome::Advanced(SyncUpdate {
            block,
            previous_height,
            balance_changes,
            app_data_changed,
        }))
    }
}

/// Run `fetch`, retrying transport errors with exponential backoff up to
/// `config.retry_attempts` attempts in total. Other errors return at once.
async fn with_retry<'a, S, T, F, Fut>(
    source: &'a S,
    config: &SyncConfig,
    what: &str,
    fetch: F,
) -> Result<T, SyncError>
where
    F: Fn(&'a S) -> Fut,
    Fut: Future<Output = Result<T, SyncError>>,
{
    let attempts = config.retry_attempts.max(1);
    let mut retry = 0;
    loop {
        match fetch(source).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retry + 1 < attempts => {
                let delay = config.backoff(retry);
                warn!(
                    what,
                    attempt = retry + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
