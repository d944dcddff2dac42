//! Rust client for the LBRY claim metadata and comments API
//!
//! The metadata server stores the social data that lives alongside
//! claims: comments, reply threads, and up/downvotes. It speaks JSON-RPC
//! 2.0 over plain HTTP POST, both single requests and batch arrays, and
//! this crate wraps that wire protocol in typed calls.
//!
//! Comments are stored flat and addressed by index; [`tree`] reassembles
//! nested reply threads out of batched id walks, so rendering a thread of
//! hundreds of comments costs a handful of POSTs.
//!
//! # Example
//!
//! ```rust,no_run
//! use lbry_metadata_client::{ClientConfig, MetadataApi};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = MetadataApi::new(ClientConfig {
//!     server_url: "http://localhost:2903/api".to_string(),
//!     ..ClientConfig::default()
//! });
//!
//! // Claim metadata; unknown URIs answer a sentinel record
//! let claim = api.get_claim("what#6769855a9aa43b67086f9ff3c1a5bacb").await?;
//! println!("{} has {} upvotes", claim.permanent_uri, claim.upvotes);
//!
//! // Post a comment and read back the thread under it
//! let id = api.post_comment("what", "lovely film").await?;
//! if let Some(thread) = api.comment_tree(id).await? {
//!     println!("{} comments in thread", thread.node_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod batch;
pub mod client;
pub mod error;
pub mod normalize;
pub mod rpc;
pub mod tree;
pub mod types;

// Re-export main types
pub use api::{canonical_uri, MetadataApi, DEFAULT_USERNAME};
pub use batch::{BatchEntry, BATCH_FLOOR};
pub use client::{ClientConfig, MetadataClient, ServerInfo};
pub use error::{MetadataError, Result, RpcErrorKind};
pub use rpc::{RequestEnvelope, ResponseEnvelope, RpcCall, RpcFault};
pub use types::{ClaimMetadata, Comment, CommentTree};
