//! Gossip Network Protocol
//!
//! Bodies exchanged between replicas of the same keyshard during anti-entropy.

use super::types::EventLogEntry;
use crate::causal::ClockRow;
use crate::membership::types::View;
use serde::{Deserialize, Serialize};

/// Receives a replica's event log.
pub const ENDPOINT_GOSSIP: &str = "/internal/gossip";
/// Prefix of the acknowledgment endpoint: `/internal/ack/{index}`.
pub const ENDPOINT_ACK: &str = "/internal/ack";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipRequest {
    /// Address the ack has to be sent back to.
    pub sender: String,
    /// View the entries were written under. Receivers on another view drop the batch.
    pub view: View,
    pub entries: Vec<EventLogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipResponse {
    pub applied: usize,
    pub discarded: usize,
}

/// Confirms that every entry up to `updated_clock` has been applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckRequest {
    pub sender: String,
    pub view: View,
    pub updated_clock: ClockRow,
}
