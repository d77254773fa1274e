//! Shared state of one running node.
//!
//! A single `KvNode` is created at startup and handed to every HTTP handler (as an axum
//! `Extension`) and to the gossip task. Nothing lives in globals.

use crate::causal::{ConflictResolver, FirstDifferenceWins};
use crate::cluster::forwarder::RequestForwarder;
use crate::gossip::types::AckTable;
use crate::membership::types::View;
use crate::storage::partitioner::PartitionManager;
use crate::storage::replica::ReplicaState;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_GOSSIP_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy)]
pub struct NodeSettings {
    /// Period of the anti-entropy round.
    pub gossip_interval: Duration,
    /// Upper bound for any call to a peer (forwarding, gossip, view change).
    pub request_timeout: Duration,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            gossip_interval: DEFAULT_GOSSIP_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct KvNode {
    pub address: String,
    /// Placement, records, vector clocks and event log. Never held across a network call.
    pub state: Mutex<ReplicaState>,
    pub acks: AckTable,
    pub forwarder: RequestForwarder,
    pub resolver: Box<dyn ConflictResolver>,
    pub settings: NodeSettings,
}

impl KvNode {
    pub fn new(partitioner: PartitionManager, settings: NodeSettings) -> Arc<Self> {
        Self::with_resolver(partitioner, settings, Box::new(FirstDifferenceWins))
    }

    pub fn with_resolver(
        partitioner: PartitionManager,
        settings: NodeSettings,
        resolver: Box<dyn ConflictResolver>,
    ) -> Arc<Self> {
        let address = partitioner.local_address().to_string();
        let forwarder = RequestForwarder::new(
            &address,
            reqwest::Client::new(),
            settings.request_timeout,
        );

        Arc::new(Self {
            address,
            state: Mutex::new(ReplicaState::new(partitioner)),
            acks: AckTable::new(),
            forwarder,
            resolver,
            settings,
        })
    }

    pub async fn key_count(&self) -> usize {
        self.state.lock().await.store.count()
    }

    pub async fn view(&self) -> View {
        self.state.lock().await.partitioner.view().clone()
    }
}
