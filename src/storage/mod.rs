//! Key-Value Storage Module
//!
//! Partitioned, replicated in-memory key-value store.
//!
//! ## Core Concepts
//! - **Partitioning**: keys map to keyshards by `stable_hash(key) % K`; the same modulus is
//!   used by every operation.
//! - **Placement**: `PartitionManager` derives each node's keyshard and replica column from
//!   its position in the view and names the primary of every keyshard.
//! - **Local writes**: `ReplicaState` stamps each write with the local vector clock and
//!   appends it to the event log under one lock.
//! - **Access**: the handlers serve keys of the local keyshard and forward the rest.

pub mod handlers;
pub mod memory;
pub mod partitioner;
pub mod protocol;
pub mod replica;
