//! Shared test fixtures
//!
//! [`FakeMetadataServer`] is a wiremock responder that behaves like a small
//! metadata server: it decodes single and batch JSON-RPC bodies, answers
//! each entry from fixture data keyed by method, and echoes envelope ids
//! back. Batch answers can be served in reverse order to exercise id
//! correlation.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use lbry_metadata_client::ClientConfig;

/// Config pointed at a mock server, with a short timeout so broken tests
/// fail fast.
pub fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        server_url: server.uri(),
        timeout_secs: 5,
        batch_size: 50,
    }
}

#[derive(Clone, Default)]
pub struct FakeMetadataServer {
    comments: HashMap<i64, Value>,
    replies: HashMap<i64, Vec<i64>>,
    claims: HashMap<String, Value>,
    canned: HashMap<String, Value>,
    faults: HashMap<String, (i64, String)>,
    reverse_batches: bool,
    posts: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl FakeMetadataServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a comment record under `id`, with the wire field names the
    /// real server uses.
    pub fn with_comment(mut self, id: i64, claim_index: i64, parent: Option<i64>, message: &str) -> Self {
        self.comments.insert(
            id,
            json!({
                "comm_index": id,
                "claim_index": claim_index,
                "poster_name": "A Cool LBRYian",
                "message": message,
                "post_time": 1_550_000_000 + id,
                "parent_com": parent,
                "upvotes": 0,
                "downvotes": 0,
            }),
        );
        self
    }

    /// Declare `children` as the ordered direct replies of `parent`.
    pub fn with_replies(mut self, parent: i64, children: &[i64]) -> Self {
        self.replies.insert(parent, children.to_vec());
        self
    }

    /// Store a claim record under its canonical URI.
    pub fn with_claim(mut self, uri: &str, claim_index: i64) -> Self {
        self.claims.insert(
            uri.to_string(),
            json!({
                "claim_index": claim_index,
                "lbry_perm_uri": uri,
                "add_time": 1_540_000_000,
                "upvotes": 3,
                "downvotes": 1,
            }),
        );
        self
    }

    /// Answer `method` with a fixed result value.
    pub fn with_result(mut self, method: &str, result: Value) -> Self {
        self.canned.insert(method.to_string(), result);
        self
    }

    /// Answer `method` with a JSON-RPC error object.
    pub fn with_fault(mut self, method: &str, code: i64, message: &str) -> Self {
        self.faults.insert(method.to_string(), (code, message.to_string()));
        self
    }

    /// Serve every batch answer array in reverse order.
    pub fn reversing_batches(mut self) -> Self {
        self.reverse_batches = true;
        self
    }

    /// Mount onto `server` and keep a handle for inspecting traffic.
    pub async fn mount(self, server: &MockServer) -> Self {
        Mock::given(method("POST"))
            .respond_with(self.clone())
            .mount(server)
            .await;
        self
    }

    /// Number of HTTP POSTs received, single and batch alike.
    pub fn post_count(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }

    /// Every decoded request body, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Entry counts of the batch (array) bodies received, in order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.requests()
            .iter()
            .filter_map(|body| body.as_array().map(Vec::len))
            .collect()
    }

    fn answer(&self, entry: &Value) -> Value {
        let id = entry.get("id").cloned().unwrap_or(Value::Null);
        let method = entry.get("method").and_then(Value::as_str).unwrap_or_default();
        match self.dispatch(method, entry.get("params")) {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err((code, message)) => {
                json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
            }
        }
    }

    fn dispatch(&self, method: &str, params: Option<&Value>) -> Result<Value, (i64, String)> {
        if let Some((code, message)) = self.faults.get(method) {
            return Err((*code, message.clone()));
        }
        if let Some(result) = self.canned.get(method) {
            return Ok(result.clone());
        }
        match method {
            "ping" => Ok(json!("pong")),
            "get_comment_data" => Ok(int_param(params, "comm_index")
                .and_then(|id| self.comments.get(&id))
                .cloned()
                .unwrap_or(Value::Null)),
            "get_comment_replies" => match int_param(params, "comm_index") {
                Some(id) if self.comments.contains_key(&id) => {
                    Ok(json!(self.replies.get(&id).cloned().unwrap_or_default()))
                }
                _ => Ok(Value::Null),
            },
            "get_claim_data" => Ok(str_param(params, "uri")
                .and_then(|uri| self.claims.get(uri))
                .cloned()
                .unwrap_or(Value::Null)),
            _ => Err((-32601, format!("method {method} not found"))),
        }
    }
}

impl Respond for FakeMetadataServer {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.posts.fetch_add(1, Ordering::SeqCst);
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        self.requests.lock().unwrap().push(body.clone());

        match body {
            Value::Array(entries) => {
                let mut answers: Vec<Value> = entries.iter().map(|e| self.answer(e)).collect();
                if self.reverse_batches {
                    answers.reverse();
                }
                ResponseTemplate::new(200).set_body_json(Value::Array(answers))
            }
            entry => ResponseTemplate::new(200).set_body_json(self.answer(&entry)),
        }
    }
}

fn int_param(params: Option<&Value>, key: &str) -> Option<i64> {
    params.and_then(|p| p.get(key)).and_then(Value::as_i64)
}

fn str_param<'a>(params: Option<&'a Value>, key: &str) -> Option<&'a str> {
    params.and_then(|p| p.get(key)).and_then(Value::as_str)
}
