//! Comment-tree materialization
//!
//! The server stores comments flat and only hands out ids: a comment's
//! record carries no replies, and `get_comment_replies` lists child ids
//! one level at a time. This module turns that into a nested
//! [`CommentTree`] in three passes, all batched so a thread of N comments
//! costs roughly N / chunk-size POSTs per level instead of N:
//!
//! 1. discover: walk reply ids level by level until no new ids show up
//! 2. fetch the root's own record (null means the thread does not exist)
//! 3. materialize: fetch every discovered body and attach children to
//!    parents, bottom-up
//!
//! Everything is iterative. Thread depth is server-controlled, so none of
//! the passes may recurse.

use std::collections::{HashMap, HashSet};

use serde_json::json;
use tracing::{debug, warn};

use crate::client::MetadataClient;
use crate::error::{MetadataError, Result};
use crate::normalize::{normalize_comment, normalize_id_list};
use crate::rpc::RpcCall;
use crate::types::{Comment, CommentTree};

/// Parent id to ordered child ids, for every parent with replies.
type ReplyIndex = HashMap<i64, Vec<i64>>;

/// Build the full reply tree rooted at `root_id`.
///
/// Returns `Ok(None)` when the server has no comment with that id. Any
/// transport or protocol failure aborts the whole build; there is no
/// partial tree.
pub async fn build_tree(client: &MetadataClient, root_id: i64) -> Result<Option<CommentTree>> {
    let index = discover_reply_index(client, root_id).await?;

    let root_value = client
        .call("get_comment_data", Some(json!({ "comm_index": root_id })))
        .await?;
    if root_value.is_null() {
        return Ok(None);
    }
    let root = normalize_comment(&root_value)?;

    materialize(client, root, &index).await.map(Some)
}

/// Walk `get_comment_replies` outward from the root until every reachable
/// id has been asked for its children once.
///
/// Each round batches one group of parents. An id already seen anywhere in
/// the walk is dropped instead of re-expanded; that guard keeps a
/// misbehaving server that lists an ancestor as a reply from looping the
/// walk forever.
async fn discover_reply_index(client: &MetadataClient, root_id: i64) -> Result<ReplyIndex> {
    let mut index = ReplyIndex::new();
    let mut seen: HashSet<i64> = HashSet::from([root_id]);
    let mut work = vec![vec![root_id]];

    while let Some(parents) = work.pop() {
        let calls: Vec<RpcCall> = parents
            .iter()
            .map(|id| RpcCall::new("get_comment_replies", json!({ "comm_index": id })))
            .collect();
        let listings = client.run_batch_clean(&calls).await?;

        for (parent, listing) in parents.iter().zip(listings) {
            let Some(value) = listing else { continue };
            let mut fresh = Vec::new();
            for id in normalize_id_list(&value)? {
                if seen.insert(id) {
                    fresh.push(id);
                } else {
                    warn!(parent, id, "comment listed twice in one thread, dropping the edge");
                }
            }
            if !fresh.is_empty() {
                index.insert(*parent, fresh.clone());
                work.push(fresh);
            }
        }
    }

    debug!(root_id, parents = index.len(), "discovered reply index");
    Ok(index)
}

/// Fetch the body of every discovered id and fold the flat records into
/// one nested tree.
async fn materialize(
    client: &MetadataClient,
    root: Comment,
    index: &ReplyIndex,
) -> Result<CommentTree> {
    let root_id = root.id;
    let mut bodies: HashMap<i64, Comment> = HashMap::from([(root_id, root)]);
    let mut fetch_order = vec![root_id];
    let mut pending = vec![root_id];

    while let Some(id) = pending.pop() {
        let Some(children) = index.get(&id) else { continue };
        let calls: Vec<RpcCall> = children
            .iter()
            .map(|child| RpcCall::new("get_comment_data", json!({ "comm_index": child })))
            .collect();
        let fetched = client.run_batch_clean(&calls).await?;

        for (child, record) in children.iter().zip(fetched) {
            match record {
                Some(value) => {
                    bodies.insert(*child, normalize_comment(&value)?);
                    fetch_order.push(*child);
                    pending.push(*child);
                }
                // Deleted between discovery and fetch; its subtree goes
                // with it.
                None => debug!(id = child, "comment vanished mid-build, skipping"),
            }
        }
    }

    attach(fetch_order, bodies, index, root_id)
}

/// Attach every fetched comment to its parent, bottom-up.
///
/// Children always entered `fetch_order` after their parent, so walking it
/// backwards has every child subtree finished before the parent that
/// collects it.
fn attach(
    fetch_order: Vec<i64>,
    mut bodies: HashMap<i64, Comment>,
    index: &ReplyIndex,
    root_id: i64,
) -> Result<CommentTree> {
    let mut built: HashMap<i64, CommentTree> = HashMap::new();
    for id in fetch_order.iter().rev() {
        let Some(comment) = bodies.remove(id) else { continue };
        let replies = index
            .get(id)
            .map(|children| {
                children
                    .iter()
                    .filter_map(|child| built.remove(child))
                    .collect()
            })
            .unwrap_or_default();
        built.insert(*id, CommentTree { comment, replies });
    }

    built
        .remove(&root_id)
        .ok_or_else(|| MetadataError::MalformedResponse("comment tree lost its root".to_string()))
}
