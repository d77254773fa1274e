//! Cluster Administration Protocol
//!
//! View changes, the redistribution trigger exchanged between nodes, and the failure
//! bodies produced when a peer cannot be reached.

use crate::membership::types::View;
use serde::{Deserialize, Serialize};

/// Public endpoint installing a new view.
pub const ENDPOINT_VIEW_CHANGE: &str = "/kv-store/view-change";
/// Internal endpoint asking a node to move away the keys it no longer serves.
pub const ENDPOINT_KEY_DISTRIBUTE: &str = "/internal/key-distribute";

/// The new view, either comma-joined (`"a:1,b:1"`) or as a JSON list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewSpec {
    Joined(String),
    List(Vec<String>),
}

impl ViewSpec {
    pub fn to_view(&self) -> View {
        match self {
            ViewSpec::Joined(raw) => View::parse(raw),
            ViewSpec::List(addresses) => View::parse(&addresses.join(",")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewChangeRequest {
    pub view: ViewSpec,
    /// Keeps the current replication factor when absent.
    #[serde(
        rename = "repl-factor",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub replication_factor: Option<usize>,
}

/// Occupancy of one node after a view change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardReport {
    pub address: String,
    #[serde(rename = "key-count")]
    pub key_count: usize,
}

/// A step of a view change that did not complete on `address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationFailure {
    pub address: String,
    /// Key left in place, for failed migrations.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub key: Option<String>,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewChangeResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    #[serde(default)]
    pub shards: Vec<ShardReport>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<MigrationFailure>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyDistributeResponse {
    pub message: String,
    #[serde(default)]
    pub moved: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<MigrationFailure>,
}

/// Body returned when a forwarded request could not reach its target.
#[derive(Debug, Serialize, Deserialize)]
pub struct ForwardFailure {
    pub error: String,
    pub message: String,
}
