//! HTTP client for a Coinvic node.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use coinvic_types::{Block, Intent, LedgerAccount};

use crate::error::{SyncError, WalletError};
use crate::source::LedgerSource;

/// Body of a successful `POST /submitIntent`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitIntentResult {
    pub ok: bool,
    pub id: String,
}

/// Body of a successful `POST /generateBlock`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateBlockResult {
    pub ok: bool,
    pub block: Option<Block>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Wraps `reqwest::Client` with the node's base URL and provides typed
/// methods for each route the wallet needs.
#[derive(Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    node_url: String,
}

impl LedgerClient {
    /// Create a client targeting `node_url` (e.g. `http://127.0.0.1:7077`).
    pub fn new(node_url: impl Into<String>, timeout: Duration) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WalletError::Node(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            node_url: node_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.node_url)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, SyncError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("GET {path}: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(SyncError::Transport(format!("GET {path}: node returned HTTP {status}")));
        }
        if !status.is_success() {
            return Err(SyncError::InvalidResponse(format!(
                "GET {path}: node returned HTTP {status}"
            )));
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, SyncError> {
        let bytes = self
            .get(path)
            .await?
            .bytes()
            .await
            .map_err(|e| SyncError::Transport(format!("GET {path}: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::InvalidResponse(format!("GET {path}: {e}")))
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Intent>,
    ) -> Result<T, WalletError> {
        let mut request = self.http.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| WalletError::Node(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(WalletError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| WalletError::Node(format!("invalid {path} response: {e}")))
    }

    /// Submit a signed intent for the next block.
    pub async fn submit_intent(&self, intent: &Intent) -> Result<SubmitIntentResult, WalletError> {
        self.post("/submitIntent", Some(intent)).await
    }

    /// Ask the node to run a production cycle now.
    pub async fn generate_block(&self) -> Result<GenerateBlockResult, WalletError> {
        self.post("/generateBlock", None).await
    }
}

impl LedgerSource for LedgerClient {
    fn latest_block(&self) -> impl Future<Output = Result<Option<Block>, SyncError>> + Send {
        async move { self.get_json("/latestBlock").await }
    }

    fn ledger_snapshot(&self) -> impl Future<Output = Result<Vec<LedgerAccount>, SyncError>> + Send {
        async move { self.get_json("/masterLedger").await }
    }

    fn app_data_snapshot(&self) -> impl Future<Output = Result<Vec<u8>, SyncError>> + Send {
        async move {
            let bytes = self
                .get("/app_data")
                .await?
                .bytes()
                .await
                .map_err(|e| SyncError::Transport(format!("GET /app_data: {e}")))?;
            Ok(bytes.to_vec())
        }
    }
}
