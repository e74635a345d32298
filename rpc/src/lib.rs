//! HTTP surface for the Coinvic node.
//!
//! Routing and serialization glue over a [`LedgerBackend`]:
//! - `POST /submitIntent`, `POST /generateBlock`
//! - `GET /latestBlock`, `GET /blocks`, `GET /masterLedger`, `GET /app_data`
//! - `GET /metrics` (Prometheus text, when enabled), `GET /health`

pub mod backend;
pub mod error;
pub mod handlers;
pub mod pagination;
pub mod server;

pub use backend::{HealthReport, LedgerBackend};
pub use error::RpcError;
pub use handlers::{GenerateBlockResponse, SubmitIntentResponse};
pub use pagination::{BlockPage, BlockPageParams};
pub use server::{router, RpcServer};
