//! Causally Consistent Key-Value Store Library
//!
//! Core modules of a sharded, replicated in-memory key-value store. The binary (`main.rs`)
//! only parses configuration and wires these together.
//!
//! ## Architecture Modules
//! - **`causal`**: vector clocks, dominance checks and the tie-break for concurrent writes.
//! - **`membership`**: the ordered view of node addresses every placement decision uses.
//! - **`storage`**: key placement, the record table and the client-facing key API.
//! - **`gossip`**: anti-entropy between replicas of a keyshard, with acks and log compaction.
//! - **`cluster`**: request forwarding and view changes with key redistribution.

pub mod causal;
pub mod cluster;
pub mod config;
pub mod error;
pub mod gossip;
pub mod membership;
pub mod node;
pub mod server;
pub mod storage;
