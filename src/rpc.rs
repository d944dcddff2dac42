//! JSON-RPC 2.0 wire envelopes
//!
//! The metadata server speaks plain JSON-RPC 2.0 over HTTP POST, in both
//! single and batch (array) form. These are the only shapes that cross the
//! transport; everything above the [`crate::client`] layer works with typed
//! records instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcErrorKind;

/// Version tag carried by every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// A single outgoing JSON-RPC request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    /// Omitted from the wire entirely when the method takes no parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestEnvelope {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }
}

/// The `error` object of a failed JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcFault {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
}

impl RpcFault {
    /// Classify this fault by its server-defined code.
    pub fn kind(&self) -> RpcErrorKind {
        RpcErrorKind::from_code(self.code)
    }
}

/// A decoded JSON-RPC response, single or one entry of a batch.
///
/// All fields are tolerated absent: the server answers "not found" as a
/// successful response with a null `result`, and some error responses skip
/// the `jsonrpc` tag altogether.
#[derive(Debug, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcFault>,
}

impl ResponseEnvelope {
    /// Split the envelope into its success/fault halves.
    ///
    /// A missing `result` on a non-error envelope decodes as `Value::Null`;
    /// callers treat null as "no such entity", never as a fault.
    pub fn into_outcome(self) -> std::result::Result<Value, RpcFault> {
        match self.error {
            Some(fault) => Err(fault),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// One method+params pair queued for a batch request.
#[derive(Debug, Clone)]
pub struct RpcCall {
    pub method: String,
    pub params: Option<Value>,
}

impl RpcCall {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params: Some(params),
        }
    }
}
