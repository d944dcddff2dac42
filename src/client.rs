//! HTTP transport for the metadata server
//!
//! One [`MetadataClient`] talks to one configured endpoint. Requests go out
//! as JSON-RPC 2.0 over HTTP POST, singly via [`MetadataClient::call`] or
//! as arrays via the batch scheduler in [`crate::batch`]. Request ids come
//! from a counter owned by the client instance, so separate sessions in the
//! same process never interfere.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{MetadataError, Result};
use crate::rpc::{RequestEnvelope, ResponseEnvelope};

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Endpoint URL of the metadata server's JSON-RPC API
    pub server_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Requested batch chunk size; values below the floor of 50 are raised
    /// to it (see [`crate::batch::BATCH_FLOOR`])
    pub batch_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:2903/api".to_string(),
            timeout_secs: 30,
            batch_size: 50,
        }
    }
}

/// Most recent `status` answer from the server, and when it arrived.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    pub status: Option<Value>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// JSON-RPC transport to a single metadata server.
pub struct MetadataClient {
    config: ClientConfig,
    http: Client,
    request_id: AtomicU64,
    connected: AtomicBool,
    server_info: Mutex<ServerInfo>,
}

impl MetadataClient {
    /// Create a new client for the configured endpoint.
    pub fn new(config: ClientConfig) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            config,
            http,
            request_id: AtomicU64::new(0),
            connected: AtomicBool::new(false),
            server_info: Mutex::new(ServerInfo::default()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn server_url(&self) -> &str {
        &self.config.server_url
    }

    /// Whether the most recent transport attempt reached the server.
    /// Starts out `false` until the first request goes through.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Snapshot of the cached server status.
    pub fn server_info(&self) -> ServerInfo {
        self.server_info.lock().expect("server info lock poisoned").clone()
    }

    /// The cached `status` result from the last [`Self::update_status`].
    pub fn status(&self) -> Option<Value> {
        self.server_info().status
    }

    /// Ask the server for its status and cache the answer.
    ///
    /// A server-reported fault clears the cache and yields `Ok(None)`
    /// rather than failing; transport problems still propagate, since then
    /// the status is unknown rather than absent.
    pub async fn update_status(&self) -> Result<Option<Value>> {
        let envelope = RequestEnvelope::new(self.next_request_id(), "status", None);
        debug!(url = %self.config.server_url, method = "status", "sending POST request to metadata server");
        let response: ResponseEnvelope = self.post_json(&envelope).await?;
        let status = response.into_outcome().ok().filter(|value| !value.is_null());

        let mut info = self.server_info.lock().expect("server info lock poisoned");
        info.status = status.clone();
        info.last_updated = Some(Utc::now());
        Ok(status)
    }

    /// Send one JSON-RPC request and return its decoded `result` value.
    ///
    /// A response carrying an `error` object becomes
    /// [`MetadataError::Rpc`]; a null `result` comes back as `Value::Null`
    /// and means "no such entity", not a failure.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let envelope = RequestEnvelope::new(self.next_request_id(), method, params);
        debug!(url = %self.config.server_url, method, "sending POST request to metadata server");
        let response: ResponseEnvelope = self.post_json(&envelope).await?;
        match response.into_outcome() {
            Ok(value) => Ok(value),
            Err(fault) => {
                warn!(
                    url = %self.config.server_url,
                    code = fault.code,
                    request_id = envelope.id,
                    "error from metadata server"
                );
                Err(MetadataError::Rpc {
                    kind: fault.kind(),
                    code: fault.code,
                    message: fault.message,
                    request_id: envelope.id,
                })
            }
        }
    }

    /// Send a pre-built envelope array as one JSON-RPC batch request.
    ///
    /// Returns the entries in arrival order; correlation by id is the batch
    /// scheduler's job.
    pub(crate) async fn post_batch(
        &self,
        envelopes: &[RequestEnvelope],
    ) -> Result<Vec<ResponseEnvelope>> {
        debug!(
            url = %self.config.server_url,
            requests = envelopes.len(),
            "sending POST batch to metadata server"
        );
        self.post_json(envelopes).await
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    /// POST a JSON body to the endpoint and decode the reply.
    async fn post_json<T, B>(&self, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let response = match self.http.post(&self.config.server_url).json(body).send().await {
            Ok(response) => {
                self.connected.store(true, Ordering::SeqCst);
                response
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                error!(url = %self.config.server_url, "failed to connect to metadata server: {e}");
                return Err(MetadataError::Transport(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Protocol {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MetadataError::MalformedResponse(format!("undecodable response body: {e}")))
    }
}
