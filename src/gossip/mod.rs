//! Gossip / Anti-Entropy Module
//!
//! Replicas of one keyshard converge by periodically exchanging their event logs.
//!
//! ## Round Structure
//! 1. **Send**: every interval a node ships its full event log to each other replica of its
//!    keyshard. Unreachable peers are skipped until the next round.
//! 2. **Merge**: the receiver applies the entries in order, keeping whichever write wins by
//!    vector clock (dominance first, then the deterministic tie-break). Batches sent under
//!    another view, or by a node that is not a replica peer, are refused; entries for keys
//!    outside the local keyshard are skipped.
//! 3. **Ack**: the receiver answers with the context of the last entry it applied, tagged
//!    with its own position in the view and the view itself. Acks from another view are
//!    refused.
//! 4. **Compact**: once every replica peer has acknowledged a prefix, that prefix is dropped
//!    from the sender's log.

pub mod handlers;
pub mod merge;
pub mod protocol;
pub mod service;
pub mod types;
