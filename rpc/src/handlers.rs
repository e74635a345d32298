//! Request handlers. Bodies are JSON mirrors of the ledger types.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, Instrument};

use coinvic_types::{Block, Intent, LedgerAccount};

use crate::backend::{HealthReport, LedgerBackend};
use crate::error::RpcError;
use crate::pagination::{BlockPage, BlockPageParams};

/// Shared handler state.
pub struct ApiState<B> {
    pub backend: Arc<B>,
    pub metrics_enabled: bool,
}

impl<B> Clone for ApiState<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            metrics_enabled: self.metrics_enabled,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitIntentResponse {
    pub ok: bool,
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateBlockResponse {
    pub ok: bool,
    /// The committed block, or `null` when no intents were pending.
    pub block: Option<Block>,
}

/// Empty object served when no application-data snapshot exists.
const EMPTY_APP_DATA: &[u8] = b"{}";

/// POST /submitIntent
pub async fn submit_intent<B: LedgerBackend>(
    State(state): State<ApiState<B>>,
    body: Bytes,
) -> Result<Json<SubmitIntentResponse>, RpcError> {
    let intent: Intent =
        serde_json::from_slice(&body).map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
    let id = intent.id.clone();
    let span = info_span!("rpc", action = "submitIntent", id = %id);
    let _enter = span.enter();
    state.backend.submit_intent(intent)?;
    Ok(Json(SubmitIntentResponse { ok: true, id }))
}

/// GET /latestBlock
pub async fn latest_block<B: LedgerBackend>(
    State(state): State<ApiState<B>>,
) -> Result<Json<Option<Block>>, RpcError> {
    Ok(Json(state.backend.latest_block()?))
}

/// GET /blocks?from=N&count=M
pub async fn blocks<B: LedgerBackend>(
    State(state): State<ApiState<B>>,
    Query(params): Query<BlockPageParams>,
) -> Result<Json<BlockPage>, RpcError> {
    let count = params.effective_count();
    let blocks = state.backend.blocks(params.start(), count as usize)?;
    Ok(Json(BlockPage::new(blocks, count)))
}

/// GET /masterLedger
pub async fn master_ledger<B: LedgerBackend>(
    State(state): State<ApiState<B>>,
) -> Result<Json<Vec<LedgerAccount>>, RpcError> {
    Ok(Json(state.backend.master_ledger()?))
}

/// GET /app_data
///
/// Serves the stored snapshot bytes unchanged so clients can hash exactly
/// what the block committed to.
pub async fn app_data<B: LedgerBackend>(
    State(state): State<ApiState<B>>,
) -> Result<Response, RpcError> {
    let bytes = state
        .backend
        .app_data()?
        .unwrap_or_else(|| EMPTY_APP_DATA.to_vec());
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

/// POST /generateBlock
pub async fn generate_block<B: LedgerBackend>(
    State(state): State<ApiState<B>>,
) -> Result<Json<GenerateBlockResponse>, RpcError> {
    let backend = Arc::clone(&state.backend);
    let block = tokio::task::spawn_blocking(move || backend.generate_block())
        .instrument(info_span!("rpc", action = "generateBlock"))
        .await
        .map_err(|e| RpcError::Server(format!("production task failed: {e}")))??;
    debug!(produced = block.is_some(), "manual production cycle finished");
    Ok(Json(GenerateBlockResponse { ok: true, block }))
}

/// GET /metrics
pub async fn metrics<B: LedgerBackend>(
    State(state): State<ApiState<B>>,
) -> Result<Response, RpcError> {
    if !state.metrics_enabled {
        return Err(RpcError::NotFound("metrics are disabled".into()));
    }
    let text = state.backend.metrics_text()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}

/// GET /health
pub async fn health<B: LedgerBackend>(
    State(state): State<ApiState<B>>,
) -> Result<Json<HealthReport>, RpcError> {
    Ok(Json(state.backend.health()?))
}
