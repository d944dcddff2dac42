//! Response normalizer
//!
//! The server spells its fields one way (`comm_index`, `poster_name`, ...)
//! and the client's canonical entities spell them another. Everything that
//! crosses from raw JSON into [`crate::types`] goes through here, so the
//! renames live in exactly one place. Pure transforms, no I/O.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{MetadataError, Result};
use crate::types::{ClaimMetadata, Comment};

/// Wire shape of a comment record.
#[derive(Debug, Deserialize)]
struct RawComment {
    comm_index: i64,
    claim_index: i64,
    poster_name: String,
    message: String,
    post_time: i64,
    /// Absent and null both mean "top-level comment".
    #[serde(default)]
    parent_com: Option<i64>,
    upvotes: u64,
    downvotes: u64,
}

/// Wire shape of a claim metadata record.
#[derive(Debug, Deserialize)]
struct RawClaim {
    claim_index: i64,
    lbry_perm_uri: String,
    add_time: i64,
    upvotes: u64,
    downvotes: u64,
}

/// Convert a raw comment record into a [`Comment`].
///
/// Fails with [`MetadataError::MalformedResponse`] when a required field is
/// missing or has the wrong type. A null or absent `parent_com` becomes
/// `parent_index: None`, which is distinct from a parent id of `0`.
pub fn normalize_comment(raw: &Value) -> Result<Comment> {
    let record: RawComment = serde_json::from_value(raw.clone())
        .map_err(|e| MetadataError::MalformedResponse(format!("comment record: {e}")))?;
    Ok(Comment {
        id: record.comm_index,
        claim_index: record.claim_index,
        author: record.poster_name,
        parent_index: record.parent_com,
        time_created: record.post_time,
        body: record.message,
        upvotes: record.upvotes,
        downvotes: record.downvotes,
    })
}

/// Convert an array of raw comment records.
pub fn normalize_comment_list(raw: &Value) -> Result<Vec<Comment>> {
    let entries = raw.as_array().ok_or_else(|| {
        MetadataError::MalformedResponse(format!("expected a comment list, got {raw}"))
    })?;
    entries.iter().map(normalize_comment).collect()
}

/// Convert a raw claim record into a [`ClaimMetadata`].
///
/// The server answers "claim unknown" as a successful null; that becomes
/// the sentinel record carrying `requested_uri`, so callers always get a
/// usable value back.
pub fn normalize_claim(raw: &Value, requested_uri: &str) -> Result<ClaimMetadata> {
    if raw.is_null() {
        return Ok(ClaimMetadata::sentinel(requested_uri));
    }
    let record: RawClaim = serde_json::from_value(raw.clone())
        .map_err(|e| MetadataError::MalformedResponse(format!("claim record: {e}")))?;
    Ok(ClaimMetadata {
        claim_index: record.claim_index,
        permanent_uri: record.lbry_perm_uri,
        time_added: record.add_time,
        upvotes: record.upvotes,
        downvotes: record.downvotes,
    })
}

/// Convert a `get_comment_replies` result into the reply ids it lists.
pub fn normalize_id_list(raw: &Value) -> Result<Vec<i64>> {
    let entries = raw.as_array().ok_or_else(|| {
        MetadataError::MalformedResponse(format!("expected a reply id list, got {raw}"))
    })?;
    entries
        .iter()
        .map(|entry| {
            entry.as_i64().ok_or_else(|| {
                MetadataError::MalformedResponse(format!("non-integer reply id {entry}"))
            })
        })
        .collect()
}
