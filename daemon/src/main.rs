//! Coinvic daemon: runs the ledger node and offers wallet-side tools.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use zeroize::Zeroizing;

use coinvic_crypto::{load_or_create_seed, Signer};
use coinvic_node::{init_logging, CoinvicNode, LogFormat, NodeConfig};
use coinvic_types::{PublicKey, WalletId};
use coinvic_wallet_core::{
    LedgerClient, RealtimeSync, SyncCallbacks, SyncConfig, SyncOutcome, WalletKeys,
    WalletSyncClient,
};

#[derive(Parser)]
#[command(name = "coinvic-daemon", about = "Coinvic ledger node and wallet tools")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "COINVIC_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for ledger storage.
    #[arg(long, env = "COINVIC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "COINVIC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "COINVIC_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the ledger node.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Ask a running node to produce a block.
    #[command(name = "block")]
    Block {
        #[command(subcommand)]
        action: BlockAction,
    },
    /// Wallet tools against a running node.
    #[command(name = "wallet")]
    Wallet {
        /// Node base URL.
        #[arg(long, default_value = "http://127.0.0.1:7077", env = "COINVIC_NODE_URL")]
        node: String,

        #[command(subcommand)]
        action: WalletAction,
    },
    /// Treasury key management.
    #[command(name = "treasury")]
    Treasury {
        #[command(subcommand)]
        action: TreasuryAction,
    },
}

#[derive(clap::Args)]
struct NodeOverrides {
    /// Seconds between production cycles; 0 produces blocks only on demand.
    #[arg(long, env = "COINVIC_BLOCK_INTERVAL")]
    block_interval: Option<u64>,

    /// Enable or disable the HTTP server.
    #[arg(long, env = "COINVIC_ENABLE_RPC")]
    rpc: Option<bool>,

    /// HTTP server port.
    #[arg(long, env = "COINVIC_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Serve Prometheus metrics on /metrics.
    #[arg(long, env = "COINVIC_ENABLE_METRICS")]
    metrics: bool,

    /// Treasury seed file.
    #[arg(long, env = "COINVIC_TREASURY_KEY")]
    treasury_key: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node until SIGINT/SIGTERM.
    Run(NodeOverrides),
}

#[derive(clap::Subcommand)]
enum BlockAction {
    /// Run a production cycle now.
    Generate {
        #[arg(long, default_value = "http://127.0.0.1:7077", env = "COINVIC_NODE_URL")]
        node: String,
    },
}

#[derive(clap::Subcommand)]
enum WalletAction {
    /// Verify the latest block and print the mirrored ledger.
    Sync {
        /// Hex treasury public key blocks must be signed with.
        #[arg(long, env = "COINVIC_TREASURY_PUBKEY")]
        treasury: PublicKey,

        /// Reject app data that does not match the block's app_data_hash.
        #[arg(long)]
        strict_app_data: bool,

        /// Keep polling until interrupted.
        #[arg(long)]
        follow: bool,

        /// Poll interval for --follow, in milliseconds.
        #[arg(long, default_value_t = 5_000)]
        poll_ms: u64,
    },
    /// Sign and submit a transfer.
    Transfer {
        /// Wallet seed file; created on first use.
        #[arg(long, env = "COINVIC_WALLET_KEY")]
        key: PathBuf,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u128,
        #[arg(long)]
        tx_id: String,
        #[arg(long, default_value = "main")]
        network: String,
    },
    /// Sign and submit a burn.
    Burn {
        #[arg(long, env = "COINVIC_WALLET_KEY")]
        key: PathBuf,
        #[arg(long)]
        amount: u128,
        #[arg(long)]
        tx_id: String,
        #[arg(long, default_value = "main")]
        network: String,
    },
    /// Print the wallet id for a seed file.
    Address {
        #[arg(long, env = "COINVIC_WALLET_KEY")]
        key: PathBuf,
    },
}

#[derive(clap::Subcommand)]
enum TreasuryAction {
    /// Print the treasury public key, creating the seed if needed.
    Pubkey,
}

/// Layer CLI and environment settings over the file (or default) config.
fn resolve_config(cli: &Cli, overrides: Option<&NodeOverrides>) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            NodeConfig::from_toml_file(path).with_context(|| "loading node configuration")?
        }
        None => NodeConfig::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }

    if let Some(o) = overrides {
        if let Some(secs) = o.block_interval {
            config.block_interval_secs = secs;
        }
        if let Some(rpc) = o.rpc {
            config.enable_rpc = rpc;
        }
        if let Some(port) = o.rpc_port {
            config.rpc_port = port;
        }
        config.enable_metrics |= o.metrics;
        if let Some(path) = &o.treasury_key {
            config.treasury_key_path = Some(path.clone());
        }
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = match &cli.command {
        Command::Node {
            action: NodeAction::Run(o),
        } => Some(o),
        _ => None,
    };
    let config = resolve_config(&cli, overrides)?;
    let format: LogFormat = config.log_format()?;
    init_logging(format, &config.log_level)?;

    match &cli.command {
        Command::Node {
            action: NodeAction::Run(_),
        } => {
            tracing::info!(
                data_dir = %config.data_dir.display(),
                interval_secs = config.block_interval_secs,
                rpc = config.enable_rpc,
                rpc_port = config.rpc_port,
                "starting Coinvic node"
            );
            let mut node = CoinvicNode::open(config)?;
            node.run().await?;
            tracing::info!("Coinvic daemon exited cleanly");
        }

        Command::Block {
            action: BlockAction::Generate { node },
        } => {
            let client = LedgerClient::new(node.as_str(), Duration::from_secs(60))?;
            let result = client.generate_block().await?;
            match result.block {
                Some(block) => println!("{}", serde_json::to_string_pretty(&block)?),
                None => println!("no unprocessed intents; no block produced"),
            }
        }

        Command::Wallet { node, action } => wallet(node, action).await?,

        Command::Treasury {
            action: TreasuryAction::Pubkey,
        } => {
            let path = config.treasury_key_path();
            let seed = Zeroizing::new(load_or_create_seed(&path)?);
            let mut treasury = Signer::from_seed(&seed);
            println!("{}", treasury.public_key());
        }
    }

    Ok(())
}

async fn wallet(node: &str, action: &WalletAction) -> anyhow::Result<()> {
    match action {
        WalletAction::Sync {
            treasury,
            strict_app_data,
            follow,
            poll_ms,
        } => {
            let mut sync_config = SyncConfig::new(node, *treasury);
            sync_config.strict_app_data = *strict_app_data;
            sync_config.poll_interval_ms = *poll_ms;
            let source = LedgerClient::new(node, sync_config.request_timeout())?;
            let mut client = WalletSyncClient::new(source, sync_config);

            if !*follow {
                match client.sync_once().await? {
                    SyncOutcome::UpToDate { height } => {
                        println!("chain height {height}, nothing to verify");
                    }
                    SyncOutcome::Advanced(update) => {
                        println!("verified block {}", update.block.block_number);
                        let balances: serde_json::Map<String, serde_json::Value> = client
                            .state()
                            .balances
                            .iter()
                            .map(|(w, b)| (w.to_string(), b.to_string().into()))
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&balances)?);
                    }
                }
                return Ok(());
            }

            let callbacks = SyncCallbacks::new()
                .on_new_block(|b| println!("block {} {}", b.block_number, b.block_hash))
                .on_balance_update(|w, b| println!("  {w}: {b}"))
                .on_app_data_update(|_| println!("  app data updated"))
                .on_error(|e| eprintln!("sync error: {e}"));
            let runner = RealtimeSync::start(client, callbacks);
            let halted = async {
                while !runner.is_finished() {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
            };
            let interrupted = tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    true
                }
                _ = halted => false,
            };
            let client = runner.shutdown().await?;
            tracing::info!(
                height = client.state().last_block_number,
                "wallet sync stopped"
            );
            if !interrupted {
                anyhow::bail!(
                    "wallet sync halted on an unverifiable block after height {}",
                    client.state().last_block_number
                );
            }
        }

        WalletAction::Transfer {
            key,
            to,
            amount,
            tx_id,
            network,
        } => {
            let keys = WalletKeys::load_or_create(key, network.as_str())?;
            let intent = keys.transfer(WalletId::new(to.as_str()), *amount, tx_id.as_str())?;
            let client = LedgerClient::new(node, Duration::from_secs(30))?;
            let result = client.submit_intent(&intent).await?;
            println!("submitted {}", result.id);
        }

        WalletAction::Burn {
            key,
            amount,
            tx_id,
            network,
        } => {
            let keys = WalletKeys::load_or_create(key, network.as_str())?;
            let intent = keys.burn(*amount, tx_id.as_str())?;
            let client = LedgerClient::new(node, Duration::from_secs(30))?;
            let result = client.submit_intent(&intent).await?;
            println!("submitted {}", result.id);
        }

        WalletAction::Address { key } => {
            let keys = WalletKeys::load_or_create(key, "main")?;
            println!("{}", keys.wallet_id());
        }
    }
    Ok(())
}
