//! Coinvic ledger node.
//!
//! The node is the single writer of the master ledger. It:
//! - Admits signed intents into the durable intent queue
//! - Runs block production cycles on a schedule or on demand
//! - Commits each block together with its balance changes, atomically
//! - Serves the HTTP surface wallets sync from
//! - Exposes Prometheus metrics and a synchronous event bus

pub mod config;
pub mod error;
pub mod ledger_event;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod producer;
pub mod scheduler;
pub mod service;
pub mod shutdown;
pub mod tracing_spans;

pub use config::NodeConfig;
pub use error::NodeError;
pub use ledger_event::{EventBus, LedgerEvent};
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::{ensure_app_data, CoinvicNode, DEFAULT_APP_DATA};
pub use producer::{BlockProducer, CycleTrigger};
pub use scheduler::spawn_block_scheduler;
pub use service::LedgerService;
pub use shutdown::ShutdownController;
