//! The Coinvic node: storage, signing keys, scheduler and HTTP server wired
//! together.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use zeroize::Zeroizing;

use coinvic_crypto::{load_or_create_seed, Signer};
use coinvic_intents::ValidationPolicy;
use coinvic_ledger::BlockBuilder;
use coinvic_nullables::SystemClock;
use coinvic_rpc::RpcServer;
use coinvic_store::{AppDataStore, BlockTable, IntentTable};
use coinvic_store_lmdb::integrity::check_data_dir;
use coinvic_store_lmdb::LmdbEnvironment;
use coinvic_types::PublicKey;

use crate::config::NodeConfig;
use crate::ledger_event::EventBus;
use crate::metrics::NodeMetrics;
use crate::producer::BlockProducer;
use crate::scheduler::spawn_block_scheduler;
use crate::service::LedgerService;
use crate::shutdown::ShutdownController;
use crate::NodeError;

/// Maximum number of LMDB named databases.
const MAX_DBS: u32 = 8;

/// Application-data snapshot written on first start.
pub const DEFAULT_APP_DATA: &str =
    r#"{"gameVersion":"0.1.0","globalSupply":0,"totalBurned":0,"inGameTokens":{}}"#;

/// Store the default application-data snapshot if none exists yet.
/// Returns whether it was written.
pub fn ensure_app_data<S: AppDataStore + ?Sized>(store: &S) -> Result<bool, NodeError> {
    if store.get_app_data()?.is_some() {
        return Ok(false);
    }
    store.put_app_data(DEFAULT_APP_DATA.as_bytes())?;
    Ok(true)
}

pub struct CoinvicNode {
    pub config: NodeConfig,
    service: Arc<LedgerService<LmdbEnvironment>>,
    shutdown: Arc<ShutdownController>,
    task_handles: Vec<JoinHandle<()>>,
}

impl CoinvicNode {
    /// Open storage and keys. Nothing runs until [`CoinvicNode::start`].
    pub fn open(config: NodeConfig) -> Result<Self, NodeError> {
        Self::open_with_events(config, EventBus::new())
    }

    /// Like [`CoinvicNode::open`], with listeners already subscribed.
    pub fn open_with_events(config: NodeConfig, events: EventBus) -> Result<Self, NodeError> {
        let lmdb_path = config.lmdb_path();
        check_data_dir(&lmdb_path).map_err(NodeError::Config)?;
        let store = Arc::new(LmdbEnvironment::open(
            &lmdb_path,
            MAX_DBS,
            config.lmdb_map_size,
        )?);

        let key_path = config.treasury_key_path();
        let seed = Zeroizing::new(load_or_create_seed(&key_path)?);
        let treasury = Signer::from_seed(&seed);

        if ensure_app_data(store.as_ref())? {
            tracing::info!("initialised default app data snapshot");
        }

        let metrics = Arc::new(NodeMetrics::new()?);
        let builder = BlockBuilder::new(
            treasury,
            Signer::new(),
            config.rotate_ephemeral_each_block,
        );
        let producer = BlockProducer::new(
            Arc::clone(&store),
            config.system_accounts(),
            builder,
            Arc::new(SystemClock),
            Arc::clone(&metrics),
            Arc::new(events),
        )
        .with_pruning(config.prune_processed_intents);

        let policy = ValidationPolicy::with_authorities(config.authorities()?);
        let service = Arc::new(LedgerService::new(Arc::clone(&store), policy, producer));

        let latest = store.latest_block()?;
        let height = latest.as_ref().map_or(0, |b| b.block_number);
        let pending = store.unprocessed_count()?;
        metrics
            .chain_height
            .set(i64::try_from(height).unwrap_or(i64::MAX));
        metrics
            .pending_intents
            .set(i64::try_from(pending).unwrap_or(i64::MAX));

        tracing::info!(
            data_dir = %config.data_dir.display(),
            height,
            pending,
            treasury = %service.producer().treasury_public_key(),
            treasury_key = %key_path.display(),
            "ledger opened"
        );

        Ok(Self {
            config,
            service,
            shutdown: Arc::new(ShutdownController::new()),
            task_handles: Vec::new(),
        })
    }

    pub fn service(&self) -> &Arc<LedgerService<LmdbEnvironment>> {
        &self.service
    }

    pub fn treasury_public_key(&self) -> PublicKey {
        self.service.producer().treasury_public_key()
    }

    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Start the scheduler and the HTTP server as configured.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        tracing::info!(
            interval_secs = self.config.block_interval_secs,
            rpc = self.config.enable_rpc,
            "Coinvic node starting"
        );

        if self.config.block_interval_secs > 0 {
            let handle = spawn_block_scheduler(
                Arc::clone(&self.service),
                Duration::from_secs(self.config.block_interval_secs),
                self.shutdown.subscribe(),
            );
            self.task_handles.push(handle);
        } else {
            tracing::info!("scheduler disabled, blocks are produced on demand");
        }

        if self.config.enable_rpc {
            let addr: SocketAddr = format!("{}:{}", self.config.rpc_bind, self.config.rpc_port)
                .parse()
                .map_err(|e| NodeError::Config(format!("invalid RPC address: {e}")))?;
            let listener = RpcServer::<LedgerService<LmdbEnvironment>>::bind(addr)
                .await
                .map_err(|e| NodeError::Rpc(e.to_string()))?;
            let server = RpcServer::new(Arc::clone(&self.service), self.config.enable_metrics);
            let mut shutdown_rx = self.shutdown.subscribe();
            let handle = tokio::spawn(async move {
                let signal = async move {
                    let _ = shutdown_rx.recv().await;
                };
                if let Err(e) = server.serve(listener, signal).await {
                    tracing::error!(error = %e, "HTTP server failed");
                }
            });
            self.task_handles.push(handle);
        }

        Ok(())
    }

    /// Start, then run until SIGINT/SIGTERM.
    pub async fn run(&mut self) -> Result<(), NodeError> {
        self.start().await?;
        self.shutdown.wait_for_signal().await;
        self.stop().await
    }

    /// Signal every task and wait for them to finish.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("Coinvic node stopping");
        self.shutdown.shutdown();
        for handle in self.task_handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "task ended abnormally");
            }
        }
        tracing::info!("Coinvic node stopped");
        Ok(())
    }
}
