//! Error types for the metadata client

use thiserror::Error;

/// Classification of a server-reported JSON-RPC error code.
///
/// The comment server documents a handful of codes; everything else falls
/// through to [`RpcErrorKind::Generic`]. Dispatch on this with a `match`
/// rather than downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorKind {
    /// Server-internal failure (code -32603)
    Internal,
    /// Request parameters did not match the method (code -32602)
    InvalidParams,
    /// The claim URI was rejected by the server (code 1)
    InvalidClaimUri,
    /// Miscellaneous server-side failure (code -1)
    Unknown,
    /// Any other JSON-RPC error code
    Generic,
}

impl RpcErrorKind {
    /// Map a raw JSON-RPC error code onto its kind.
    pub fn from_code(code: i64) -> Self {
        match code {
            -32603 => RpcErrorKind::Internal,
            -32602 => RpcErrorKind::InvalidParams,
            1 => RpcErrorKind::InvalidClaimUri,
            -1 => RpcErrorKind::Unknown,
            _ => RpcErrorKind::Generic,
        }
    }
}

/// Metadata client error
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The server could not be reached (DNS, connect, timeout). The result
    /// of the attempted operation is unknown, not empty.
    #[error("failed to reach metadata server: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-2xx HTTP status.
    #[error("metadata server returned HTTP {status}: {reason}")]
    Protocol { status: u16, reason: String },

    /// A decoded response carried a JSON-RPC `error` object.
    #[error("metadata server error {code} ({kind:?}) answering request {request_id}: {}", .message.as_deref().unwrap_or("no message"))]
    Rpc {
        kind: RpcErrorKind,
        code: i64,
        message: Option<String>,
        request_id: u64,
    },

    /// The response body was not a decodable JSON-RPC envelope, or a
    /// successful record was missing a required field.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A client-side precondition failed before any request was sent.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

/// Result type for metadata operations
pub type Result<T> = std::result::Result<T, MetadataError>;
