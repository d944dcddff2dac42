//! Batch scheduler
//!
//! Folds a list of independent calls into fixed-size JSON-RPC batch
//! requests so a thread of hundreds of comments costs a handful of POSTs
//! instead of hundreds. Within one chunk the envelope ids are the chunk
//! positions 0..n, and responses are put back in request order by id since
//! the server may answer a batch in any order.

use serde_json::Value;

use crate::client::MetadataClient;
use crate::error::{MetadataError, Result};
use crate::rpc::{RequestEnvelope, ResponseEnvelope, RpcCall, RpcFault};

/// Smallest chunk size the scheduler will use. Configured sizes below this
/// are raised to it, so a tiny `batch_size` caps request count rather than
/// exploding it.
pub const BATCH_FLOOR: usize = 50;

/// Per-entry outcome of a batch: the decoded `result` value, or the fault
/// the server attached to that entry.
pub type BatchEntry = std::result::Result<Value, RpcFault>;

/// The chunk size actually used for a configured `batch_size`.
pub fn effective_chunk_size(requested: usize) -> usize {
    requested.max(BATCH_FLOOR)
}

impl MetadataClient {
    /// Run every call, chunked into batch POSTs, and return one outcome per
    /// call in the original order.
    ///
    /// Chunks go out sequentially. Any transport or protocol failure aborts
    /// the whole run; per-entry faults do not, they land in the entry's
    /// [`BatchEntry`].
    pub async fn run_batch(&self, calls: &[RpcCall]) -> Result<Vec<BatchEntry>> {
        let chunk_size = effective_chunk_size(self.config().batch_size);
        let mut outcomes = Vec::with_capacity(calls.len());
        for chunk in calls.chunks(chunk_size) {
            let envelopes: Vec<RequestEnvelope> = chunk
                .iter()
                .enumerate()
                .map(|(slot, call)| {
                    RequestEnvelope::new(slot as u64, &call.method, call.params.clone())
                })
                .collect();
            let responses = self.post_batch(&envelopes).await?;
            outcomes.extend(correlate(chunk.len(), responses)?);
        }
        Ok(outcomes)
    }

    /// [`Self::run_batch`] for callers that only want the values that came
    /// back: per-entry faults and null results both collapse to `None`.
    pub async fn run_batch_clean(&self, calls: &[RpcCall]) -> Result<Vec<Option<Value>>> {
        let outcomes = self.run_batch(calls).await?;
        Ok(outcomes
            .into_iter()
            .map(|outcome| match outcome {
                Ok(Value::Null) => None,
                Ok(value) => Some(value),
                Err(_) => None,
            })
            .collect())
    }
}

/// Put one chunk's responses back in request order by their envelope ids.
///
/// Every id 0..expected must show up exactly once; anything else means the
/// correlation cannot be trusted and the chunk is rejected as malformed.
fn correlate(expected: usize, responses: Vec<ResponseEnvelope>) -> Result<Vec<BatchEntry>> {
    let mut slots: Vec<Option<ResponseEnvelope>> = (0..expected).map(|_| None).collect();
    for response in responses {
        let id = response.id.ok_or_else(|| {
            MetadataError::MalformedResponse("batch response entry without an id".to_string())
        })?;
        let slot = slots.get_mut(id as usize).ok_or_else(|| {
            MetadataError::MalformedResponse(format!(
                "batch response id {id} out of range for a chunk of {expected}"
            ))
        })?;
        if slot.is_some() {
            return Err(MetadataError::MalformedResponse(format!(
                "duplicate batch response id {id}"
            )));
        }
        *slot = Some(response);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(slot, response)| {
            response.map(ResponseEnvelope::into_outcome).ok_or_else(|| {
                MetadataError::MalformedResponse(format!("no batch response for id {slot}"))
            })
        })
        .collect()
}
