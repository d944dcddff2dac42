//! Canonical entities for the metadata API

use serde::{Deserialize, Serialize};

/// `claim_index` value carried by the sentinel record for URIs the server
/// has never seen.
pub const SENTINEL_CLAIM_INDEX: i64 = -1;

/// A single comment with the client's canonical field names.
///
/// The wire format spells these differently (`comm_index`, `poster_name`,
/// `message`, `post_time`, `parent_com`); [`crate::normalize`] is the only
/// producer of this type, so raw server maps never leak past the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Server-assigned id, unique per server instance.
    pub id: i64,
    /// Index of the claim this comment is attached to.
    pub claim_index: i64,
    /// Username of the poster.
    pub author: String,
    /// Id of the comment this one replies to; `None` means top-level.
    /// `Some(0)` is a real parent id, not a marker.
    pub parent_index: Option<i64>,
    /// Posting time, UTC epoch seconds.
    pub time_created: i64,
    /// Message body.
    pub body: String,
    pub upvotes: u64,
    pub downvotes: u64,
}

impl Comment {
    /// Whether this comment sits directly on its claim rather than under
    /// another comment.
    pub fn is_top_level(&self) -> bool {
        self.parent_index.is_none()
    }
}

/// Vote counts and bookkeeping the server stores alongside a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimMetadata {
    /// Server-side index of the claim, or [`SENTINEL_CLAIM_INDEX`].
    pub claim_index: i64,
    /// Canonical `lbry://...` URI.
    pub permanent_uri: String,
    /// When the server first recorded the claim, UTC epoch seconds.
    pub time_added: i64,
    pub upvotes: u64,
    pub downvotes: u64,
}

impl ClaimMetadata {
    /// Placeholder record for a URI the server has no data for.
    pub fn sentinel(uri: impl Into<String>) -> Self {
        Self {
            claim_index: SENTINEL_CLAIM_INDEX,
            permanent_uri: uri.into(),
            time_added: 0,
            upvotes: 0,
            downvotes: 0,
        }
    }

    /// Whether this record was synthesized client-side rather than returned
    /// by the server.
    pub fn is_sentinel(&self) -> bool {
        self.claim_index == SENTINEL_CLAIM_INDEX
    }
}

/// A comment plus its direct replies, nested all the way down.
///
/// Built transiently per query by [`crate::tree`]; never persisted. The
/// discovery pass guarantees no comment appears twice in one tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentTree {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentTree>,
}

impl CommentTree {
    /// A node with no replies attached yet.
    pub fn leaf(comment: Comment) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }

    /// Total number of comments in this tree, the root included.
    ///
    /// Iterative so that pathological thread depth cannot overflow the
    /// stack.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }
}
