use super::merge::{MergeReport, apply_log};
use super::protocol::{AckRequest, ENDPOINT_ACK, ENDPOINT_GOSSIP, GossipRequest};
use super::types::AckTable;
use crate::causal::ClockRow;
use crate::error::{KvError, KvResult};
use crate::membership::types::View;
use crate::node::KvNode;
use crate::storage::partitioner::PartitionManager;
use crate::storage::replica::ReplicaState;

use axum::http::Method;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound of the random delay added to each round so replicas drift apart.
const ROUND_JITTER_MS: u64 = 250;

/// Anti-entropy between the replicas of the local keyshard.
pub struct GossipService {
    node: Arc<KvNode>,
}

impl GossipService {
    pub fn new(node: Arc<KvNode>) -> Self {
        Self { node }
    }

    pub async fn start(self: Arc<Self>) {
        tracing::info!(
            "Starting gossip every {:?} from {}",
            self.node.settings.gossip_interval,
            self.node.address
        );

        let mut interval = tokio::time::interval(self.node.settings.gossip_interval);
        loop {
            interval.tick().await;
            let jitter = rand::thread_rng().gen_range(0..=ROUND_JITTER_MS);
            tokio::time::sleep(Duration::from_millis(jitter)).await;

            let reached = self.run_round().await;
            tracing::debug!("Gossip round reached {} peer(s)", reached);
        }
    }

    /// Ships the whole event log to every replica peer. Returns how many peers accepted it.
    ///
    /// Unreachable peers are skipped; the next round retries them.
    pub async fn run_round(&self) -> usize {
        let (peers, view, entries) = {
            let mut state = self.node.state.lock().await;
            compact_log(&mut state, &self.node.acks);
            (
                state.partitioner.replica_peers(),
                state.partitioner.view().clone(),
                state.event_log.entries().to_vec(),
            )
        };

        if entries.is_empty() || peers.is_empty() {
            return 0;
        }

        let request = GossipRequest {
            sender: self.node.address.clone(),
            view,
            entries,
        };

        let mut reached = 0;
        for (index, address) in peers {
            match self.send_log(&address, &request).await {
                Ok(()) => {
                    tracing::debug!(
                        "Sent {} entries to peer {} ({})",
                        request.entries.len(),
                        index,
                        address
                    );
                    reached += 1;
                }
                Err(e) => {
                    tracing::warn!("Gossip to {} failed: {}", address, e);
                }
            }
        }
        reached
    }

    async fn send_log(&self, address: &str, request: &GossipRequest) -> KvResult<()> {
        let response = self
            .node
            .forwarder
            .send_json(Method::PUT, address, ENDPOINT_GOSSIP, request)
            .await?;

        if !response.status().is_success() {
            return Err(KvError::PeerRejected {
                address: address.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    /// Merges a peer's log under the state lock.
    ///
    /// The batch is refused unless its sender is a replica peer under the view both nodes
    /// have installed. On success this node's index in the view is returned with the
    /// report; it tags the ack.
    pub async fn receive(&self, request: &GossipRequest) -> KvResult<(MergeReport, usize)> {
        let mut state = self.node.state.lock().await;
        let own_index = check_peer(&state.partitioner, &request.view, &request.sender, None)?;

        let report = apply_log(&mut state, &request.entries, self.node.resolver.as_ref());
        tracing::debug!(
            "Merged gossip from {}: {} applied, {} discarded",
            request.sender,
            report.applied,
            report.discarded
        );
        Ok((report, own_index))
    }

    pub async fn send_ack(
        &self,
        sender: &str,
        own_index: usize,
        view: View,
        updated_clock: ClockRow,
    ) -> KvResult<()> {
        let path = format!("{}/{}", ENDPOINT_ACK, own_index);
        let ack = AckRequest {
            sender: self.node.address.clone(),
            view,
            updated_clock,
        };
        let response = self
            .node
            .forwarder
            .send_json(Method::PUT, sender, &path, &ack)
            .await?;

        if !response.status().is_success() {
            return Err(KvError::PeerRejected {
                address: sender.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    /// Records a peer's ack and drops the log prefix every peer has confirmed.
    ///
    /// Acks sent under another view, or whose index does not name the sending replica
    /// peer, are refused: their clock describes a log this node no longer has.
    pub async fn record_ack(&self, peer_index: usize, ack: AckRequest) -> KvResult<usize> {
        let mut state = self.node.state.lock().await;
        check_peer(&state.partitioner, &ack.view, &ack.sender, Some(peer_index))?;

        self.node.acks.record(peer_index, ack.updated_clock);
        Ok(compact_log(&mut state, &self.node.acks))
    }
}

/// Checks that `sender` is a replica peer of this node under `view`, which has to be the
/// installed one. With `peer_index` the sender must also sit at that position. Returns
/// the local node's index in the view.
fn check_peer(
    partitioner: &PartitionManager,
    view: &View,
    sender: &str,
    peer_index: Option<usize>,
) -> KvResult<usize> {
    let stale = || KvError::StalePeer {
        sender: sender.to_string(),
    };
    if partitioner.view() != view {
        tracing::debug!("Refusing {}: it is on view {}", sender, view);
        return Err(stale());
    }
    let is_peer = partitioner
        .replica_peers()
        .iter()
        .any(|(index, address)| {
            address == sender && peer_index.is_none_or(|expected| expected == *index)
        });
    if !is_peer {
        return Err(stale());
    }
    partitioner.local_index().ok_or_else(stale)
}

/// Drops the entries every replica peer has acknowledged. With no replica peers nobody
/// needs the log and it is cleared.
pub fn compact_log(state: &mut ReplicaState, acks: &AckTable) -> usize {
    let peers: Vec<usize> = state
        .partitioner
        .replica_peers()
        .into_iter()
        .map(|(index, _)| index)
        .collect();

    if peers.is_empty() {
        let dropped = state.event_log.len();
        state.event_log.clear();
        return dropped;
    }

    match acks.watermark(&peers) {
        Some(watermark) => {
            let dropped = state.event_log.compact(&watermark);
            if dropped > 0 {
                tracing::debug!("Compacted {} acknowledged log entries", dropped);
            }
            dropped
        }
        None => 0,
    }
}
