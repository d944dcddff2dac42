//! High-level metadata API
//!
//! Typed wrappers over every method the comment server exposes, one async
//! fn per method. Client-side checks run before any I/O: URIs get the
//! `lbry://` prefix, message bodies and usernames are trimmed and
//! length-checked. "Not found" answers surface as `None`, never as errors.

use serde_json::{json, Value};

use crate::client::{ClientConfig, MetadataClient};
use crate::error::{MetadataError, Result};
use crate::normalize::{normalize_claim, normalize_comment, normalize_comment_list, normalize_id_list};
use crate::rpc::RpcCall;
use crate::tree;
use crate::types::{ClaimMetadata, Comment, CommentTree};

/// Poster name used when none is configured.
pub const DEFAULT_USERNAME: &str = "A Cool LBRYian";

/// Bounds on a trimmed message body, in characters, both inclusive.
const MESSAGE_MIN_CHARS: usize = 2;
const MESSAGE_MAX_CHARS: usize = 65_535;
/// Bounds on a trimmed username: minimum inclusive, maximum exclusive.
const USERNAME_MIN_CHARS: usize = 2;
const USERNAME_MAX_CHARS: usize = 128;

/// Typed interface to one metadata server.
pub struct MetadataApi {
    client: MetadataClient,
    username: String,
}

impl MetadataApi {
    /// Create an API handle posting under [`DEFAULT_USERNAME`].
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: MetadataClient::new(config),
            username: DEFAULT_USERNAME.to_string(),
        }
    }

    /// Create an API handle posting under `username`.
    pub fn with_username(config: ClientConfig, username: &str) -> Result<Self> {
        let mut api = Self::new(config);
        api.set_username(username)?;
        Ok(api)
    }

    /// The poster name sent with [`Self::post_comment`] and
    /// [`Self::post_reply`].
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Replace the poster name, trimmed and length-checked first.
    pub fn set_username(&mut self, username: &str) -> Result<()> {
        self.username = validate_username(username)?.to_string();
        Ok(())
    }

    /// The transport underneath, for status probes and raw calls.
    pub fn client(&self) -> &MetadataClient {
        &self.client
    }

    /// Liveness check; the server answers with a short greeting string.
    pub async fn ping(&self) -> Result<String> {
        let value = self.client.call("ping", None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| MetadataError::MalformedResponse(format!("ping answered {value}")))
    }

    /// Metadata stored for a claim URI.
    ///
    /// A claim the server has never seen comes back as the sentinel record
    /// rather than an error, so the caller always has something to render.
    pub async fn get_claim(&self, uri: &str) -> Result<ClaimMetadata> {
        let uri = canonical_uri(uri);
        let value = self
            .client
            .call("get_claim_data", Some(json!({ "uri": uri })))
            .await?;
        normalize_claim(&value, &uri)
    }

    /// Upvote a claim, or take the vote back with `undo`. Answers the new
    /// total, or `None` when the claim is unknown.
    pub async fn upvote_claim(&self, uri: &str, undo: bool) -> Result<Option<u64>> {
        let value = self
            .client
            .call(
                "upvote_claim",
                Some(json!({ "uri": canonical_uri(uri), "undo": undo })),
            )
            .await?;
        vote_total(&value)
    }

    /// Downvote a claim, or take the vote back with `undo`.
    pub async fn downvote_claim(&self, uri: &str, undo: bool) -> Result<Option<u64>> {
        let value = self
            .client
            .call(
                "downvote_claim",
                Some(json!({ "uri": canonical_uri(uri), "undo": undo })),
            )
            .await?;
        vote_total(&value)
    }

    /// Permanent URI for a claim index, or `None` when the index is
    /// unknown. The sentinel index is negative, so the absolute value goes
    /// on the wire.
    pub async fn get_claim_uri(&self, claim_index: i64) -> Result<Option<String>> {
        let value = self
            .client
            .call(
                "get_claim_uri",
                Some(json!({ "claim_index": claim_index.abs() })),
            )
            .await?;
        match value {
            Value::Null => Ok(None),
            Value::String(uri) => Ok(Some(uri)),
            other => Err(MetadataError::MalformedResponse(format!(
                "claim uri answered {other}"
            ))),
        }
    }

    /// Every comment stored for a claim, flat and in server order, or
    /// `None` when the claim is unknown.
    pub async fn get_claim_comments(&self, uri: &str) -> Result<Option<Vec<Comment>>> {
        let value = self
            .client
            .call("get_claim_comments", Some(json!({ "uri": canonical_uri(uri) })))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        normalize_comment_list(&value).map(Some)
    }

    /// Post a top-level comment on a claim. Answers the new comment's id.
    pub async fn post_comment(&self, uri: &str, message: &str) -> Result<i64> {
        let message = validate_message(message)?;
        let value = self
            .client
            .call(
                "comment",
                Some(json!({
                    "uri": canonical_uri(uri),
                    "poster": self.username,
                    "message": message,
                })),
            )
            .await?;
        new_comment_id(&value)
    }

    /// Post a reply under an existing comment. Answers the new comment's
    /// id.
    pub async fn post_reply(&self, parent_id: i64, message: &str) -> Result<i64> {
        let message = validate_message(message)?;
        let value = self
            .client
            .call(
                "reply",
                Some(json!({
                    "parent_id": parent_id,
                    "poster": self.username,
                    "message": message,
                })),
            )
            .await?;
        new_comment_id(&value)
    }

    /// One comment's record, or `None` when the id is unknown.
    pub async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        let value = self
            .client
            .call("get_comment_data", Some(json!({ "comm_index": comment_id })))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        normalize_comment(&value).map(Some)
    }

    /// Upvote a comment, or take the vote back with `undo`.
    pub async fn upvote_comment(&self, comment_id: i64, undo: bool) -> Result<Option<u64>> {
        let value = self
            .client
            .call(
                "upvote_comment",
                Some(json!({ "comm_index": comment_id, "undo": undo })),
            )
            .await?;
        vote_total(&value)
    }

    /// Downvote a comment, or take the vote back with `undo`.
    pub async fn downvote_comment(&self, comment_id: i64, undo: bool) -> Result<Option<u64>> {
        let value = self
            .client
            .call(
                "downvote_comment",
                Some(json!({ "comm_index": comment_id, "undo": undo })),
            )
            .await?;
        vote_total(&value)
    }

    /// Ids of a comment's direct replies, in server order. An unknown
    /// comment id answers an empty list.
    pub async fn get_reply_ids(&self, comment_id: i64) -> Result<Vec<i64>> {
        let value = self
            .client
            .call(
                "get_comment_replies",
                Some(json!({ "comm_index": comment_id })),
            )
            .await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        normalize_id_list(&value)
    }

    /// A comment's direct replies with their full records, fetched as one
    /// batch. Replies deleted between the id listing and the fetch are
    /// skipped.
    pub async fn get_replies(&self, comment_id: i64) -> Result<Vec<Comment>> {
        let ids = self.get_reply_ids(comment_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let calls: Vec<RpcCall> = ids
            .iter()
            .map(|id| RpcCall::new("get_comment_data", json!({ "comm_index": id })))
            .collect();
        let fetched = self.client.run_batch_clean(&calls).await?;
        fetched.iter().flatten().map(normalize_comment).collect()
    }

    /// The whole reply tree under a comment, or `None` when the id is
    /// unknown. See [`crate::tree`] for how the flat records are folded.
    pub async fn comment_tree(&self, root_id: i64) -> Result<Option<CommentTree>> {
        tree::build_tree(&self.client, root_id).await
    }
}

/// Prefix `uri` with the `lbry://` scheme unless it already carries it.
pub fn canonical_uri(uri: &str) -> String {
    if uri.starts_with("lbry://") {
        uri.to_string()
    } else {
        format!("lbry://{uri}")
    }
}

fn validate_message(message: &str) -> Result<&str> {
    let trimmed = message.trim();
    let chars = trimmed.chars().count();
    if !(MESSAGE_MIN_CHARS..=MESSAGE_MAX_CHARS).contains(&chars) {
        return Err(MetadataError::Validation {
            field: "message",
            reason: format!(
                "body must be {MESSAGE_MIN_CHARS} to {MESSAGE_MAX_CHARS} characters after trimming, got {chars}"
            ),
        });
    }
    Ok(trimmed)
}

fn validate_username(username: &str) -> Result<&str> {
    let trimmed = username.trim();
    let chars = trimmed.chars().count();
    if !(USERNAME_MIN_CHARS..USERNAME_MAX_CHARS).contains(&chars) {
        return Err(MetadataError::Validation {
            field: "username",
            reason: format!(
                "must be at least {USERNAME_MIN_CHARS} and under {USERNAME_MAX_CHARS} characters after trimming, got {chars}"
            ),
        });
    }
    Ok(trimmed)
}

fn vote_total(value: &Value) -> Result<Option<u64>> {
    match value {
        Value::Null => Ok(None),
        other => other.as_u64().map(Some).ok_or_else(|| {
            MetadataError::MalformedResponse(format!("vote total answered {other}"))
        }),
    }
}

fn new_comment_id(value: &Value) -> Result<i64> {
    value.as_i64().ok_or_else(|| {
        MetadataError::MalformedResponse(format!("new comment id answered {value}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_uri_prepends_scheme() {
        assert_eq!(canonical_uri("what"), "lbry://what");
        assert_eq!(canonical_uri("what#6769855a"), "lbry://what#6769855a");
    }

    #[test]
    fn test_canonical_uri_keeps_existing_scheme() {
        assert_eq!(canonical_uri("lbry://what"), "lbry://what");
    }

    #[test]
    fn test_message_bounds() {
        assert!(validate_message("a").is_err());
        assert_eq!(validate_message("ab").unwrap(), "ab");
        assert!(validate_message(&"x".repeat(65_535)).is_ok());
        assert!(validate_message(&"x".repeat(65_536)).is_err());
    }

    #[test]
    fn test_message_is_trimmed_before_checking() {
        // Five bytes of padding around one character still fails.
        assert!(validate_message("  a  \n").is_err());
        assert_eq!(validate_message("\t hello \n").unwrap(), "hello");
    }

    #[test]
    fn test_message_length_counts_characters_not_bytes() {
        // Two characters, four bytes.
        assert!(validate_message("éé").is_ok());
        // One character, two bytes; a byte count would wrongly accept it.
        assert!(validate_message("é").is_err());
    }

    #[test]
    fn test_username_bounds() {
        assert!(validate_username("a").is_err());
        assert_eq!(validate_username("ab").unwrap(), "ab");
        assert!(validate_username(&"x".repeat(127)).is_ok());
        // The upper bound is exclusive.
        assert!(validate_username(&"x".repeat(128)).is_err());
        assert_eq!(validate_username("  spaced out  ").unwrap(), "spaced out");
    }

    #[test]
    fn test_default_username_is_valid() {
        assert!(validate_username(DEFAULT_USERNAME).is_ok());
    }

    #[test]
    fn test_set_username_rejects_bad_names() {
        let mut api = MetadataApi::new(ClientConfig::default());
        assert_eq!(api.username(), DEFAULT_USERNAME);
        assert!(api.set_username("x").is_err());
        assert_eq!(api.username(), DEFAULT_USERNAME);
        api.set_username("  tester  ").unwrap();
        assert_eq!(api.username(), "tester");
    }

    #[test]
    fn test_vote_total_decoding() {
        assert_eq!(vote_total(&serde_json::json!(12)).unwrap(), Some(12));
        assert_eq!(vote_total(&Value::Null).unwrap(), None);
        assert!(vote_total(&serde_json::json!("12")).is_err());
        assert!(vote_total(&serde_json::json!(-3)).is_err());
    }

    #[test]
    fn test_new_comment_id_decoding() {
        assert_eq!(new_comment_id(&serde_json::json!(41)).unwrap(), 41);
        assert!(new_comment_id(&Value::Null).is_err());
        assert!(new_comment_id(&serde_json::json!({"id": 41})).is_err());
    }
}
