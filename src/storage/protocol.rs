//! Key-Value API Protocol
//!
//! Endpoints and bodies of the client-facing key-value API. Peers use the same endpoints
//! (marked with the `from_node` header) when requests are forwarded or keys are migrated.

use super::memory::Value;
use crate::causal::ClockRow;
use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Prefix of the per-key endpoints: `/kv-store/keys/{key}`.
pub const ENDPOINT_KEYS: &str = "/kv-store/keys";
/// Number of live keys held by the answering node.
pub const ENDPOINT_KEY_COUNT: &str = "/kv-store/key-count";
/// Prefix of the shard information endpoint: `/kv-store/shards/{id}`.
pub const ENDPOINT_SHARDS: &str = "/kv-store/shards";
/// Currently installed view.
pub const ENDPOINT_GET_VIEW: &str = "/get-view";

// --- Data Transfer Objects ---

/// Body of a PUT. A missing or `null` value is rejected with 400.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PutRequest {
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub message: String,
    pub replaced: bool,
    /// Serving node, reported to peers only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
}

/// Successful GET and DELETE answers.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyResponse {
    #[serde(rename = "doesExist")]
    pub does_exist: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
}

/// Every failed key operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Present on GET and DELETE failures.
    #[serde(
        rename = "doesExist",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub does_exist: Option<bool>,
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyCountResponse {
    pub message: String,
    #[serde(rename = "key-count")]
    pub key_count: usize,
    #[serde(rename = "shard-id", skip_serializing_if = "Option::is_none", default)]
    pub shard_id: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShardInfoResponse {
    pub message: String,
    #[serde(rename = "shard-id", skip_serializing_if = "Option::is_none", default)]
    pub shard_id: Option<usize>,
    #[serde(rename = "key-count", skip_serializing_if = "Option::is_none", default)]
    pub key_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub replicas: Option<Vec<String>>,
    #[serde(
        rename = "causal-context",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub causal_context: Option<ClockRow>,
}
