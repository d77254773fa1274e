//! View installation and key redistribution.
//!
//! A view change is coordinated by whichever node receives it from the administrator:
//!
//! 1. install the view locally;
//! 2. hand the request, marked as forwarded, to every node of the new and of the old view
//!    (removed nodes must learn that they no longer own anything);
//! 3. once they have all installed it, ask each of them to push away the keys the new view
//!    places elsewhere, then do the same locally;
//! 4. collect every node's key count.
//!
//! A node handles one view change at a time; a forwarded change waits for a coordinated
//! one in progress on the same node. Two coordinators notifying each other at once wait
//! until the peer call times out and report that peer as failed.
//!
//! Nothing is rolled back. A node that cannot be reached keeps its old view and its keys,
//! migrations that did succeed stay in place, and the coordinator reports every failed step
//! instead of pretending the change went through.

use super::protocol::{
    ENDPOINT_KEY_DISTRIBUTE, ENDPOINT_VIEW_CHANGE, KeyDistributeResponse, MigrationFailure,
    ShardReport, ViewChangeRequest,
};
use crate::error::{KvError, KvResult};
use crate::membership::types::View;
use crate::node::KvNode;
use crate::storage::partitioner::PartitionManager;
use crate::storage::protocol::{ENDPOINT_KEY_COUNT, KeyCountResponse};

use axum::http::Method;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What a view change achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewChangeOutcome {
    /// Forwarded request: the view was installed, nothing else.
    Installed,
    /// Coordinated change with the occupancy of every node of the new view.
    Coordinated {
        shards: Vec<ShardReport>,
        failures: Vec<MigrationFailure>,
    },
}

/// Result of pushing misplaced keys to their new owners.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RedistributionReport {
    pub moved: usize,
    pub failures: Vec<MigrationFailure>,
}

pub struct ViewManager {
    node: Arc<KvNode>,
    /// Serialises every view change on this node, coordinated or forwarded.
    pub(super) coordinator: Mutex<()>,
}

impl ViewManager {
    pub fn new(node: Arc<KvNode>) -> Self {
        Self {
            node,
            coordinator: Mutex::new(()),
        }
    }

    /// Installs `view`, keeping the current replication factor unless one is given.
    /// Returns the view that was replaced.
    pub async fn install(&self, view: View, replication_factor: Option<usize>) -> KvResult<View> {
        let previous = {
            let mut state = self.node.state.lock().await;
            let replication_factor =
                replication_factor.unwrap_or(state.partitioner.replication_factor());
            let partitioner = PartitionManager::new(&self.node.address, view, replication_factor)?;
            let previous = state.partitioner.view().clone();
            state.install_view(partitioner);

            tracing::info!(
                "Installed view {} (R={}, keyshard={:?}, replica={:?})",
                state.partitioner.view(),
                state.partitioner.replication_factor(),
                state.partitioner.keyshard_id(),
                state.partitioner.replica_id()
            );
            previous
        };
        self.node.acks.clear();
        Ok(previous)
    }

    /// Sends every live key the installed view places elsewhere to its new owner.
    ///
    /// A key is deleted locally only after its owner accepted it; otherwise it stays and the
    /// failure is reported. Tombstones of foreign keys are simply dropped.
    pub async fn redistribute_local_keys(&self) -> RedistributionReport {
        let misplaced = {
            let mut state = self.node.state.lock().await;
            let purged = state.purge_foreign_tombstones();
            if purged > 0 {
                tracing::debug!("Dropped {} tombstones of foreign keys", purged);
            }
            state.misplaced_records()
        };

        let mut report = RedistributionReport::default();
        for (key, owner, record) in misplaced {
            let Some(value) = record.value.as_ref() else {
                continue;
            };

            match self.node.forwarder.put_value(&owner, &key, value).await {
                Ok(()) => {
                    let mut state = self.node.state.lock().await;
                    // A write that landed while the key was in flight stays for the next pass.
                    if state.store.record(&key) == Some(&record) {
                        state.store.purge(&key);
                    }
                    report.moved += 1;
                }
                Err(e) => {
                    tracing::warn!("Keeping {}: {} did not accept it ({})", key, owner, e);
                    report.failures.push(MigrationFailure {
                        address: owner,
                        key: Some(key),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Redistribution moved {} key(s), {} failure(s)",
            report.moved,
            report.failures.len()
        );
        report
    }

    /// Entry point of `PUT /kv-store/view-change`.
    pub async fn change_view(
        &self,
        request: ViewChangeRequest,
        forwarded: bool,
    ) -> KvResult<ViewChangeOutcome> {
        let view = request.view.to_view();
        if view.is_empty() {
            return Err(KvError::InvalidView("view is empty".to_string()));
        }

        let _guard = self.coordinator.lock().await;
        if forwarded {
            self.install(view, request.replication_factor).await?;
            return Ok(ViewChangeOutcome::Installed);
        }

        let previous = self.install(view.clone(), request.replication_factor).await?;

        let peers: Vec<String> = view
            .union(&previous)
            .into_iter()
            .filter(|address| address != &self.node.address)
            .collect();
        let mut failures = Vec::new();

        for peer in &peers {
            if let Err(e) = self.notify_peer(peer, &request).await {
                failures.push(MigrationFailure {
                    address: peer.clone(),
                    key: None,
                    reason: e.to_string(),
                });
            }
        }

        for peer in &peers {
            failures.extend(self.trigger_redistribution(peer).await);
        }

        failures.extend(self.redistribute_local_keys().await.failures);

        let mut shards = Vec::new();
        for address in view.addresses() {
            match self.key_count_of(address).await {
                Ok(key_count) => shards.push(ShardReport {
                    address: address.clone(),
                    key_count,
                }),
                Err(e) => failures.push(MigrationFailure {
                    address: address.clone(),
                    key: None,
                    reason: format!("Node {} did not report its key count: {}", address, e),
                }),
            }
        }

        if failures.is_empty() {
            tracing::info!("View change to {} completed", view);
        } else {
            tracing::warn!(
                "View change to {} completed with {} failure(s)",
                view,
                failures.len()
            );
        }

        Ok(ViewChangeOutcome::Coordinated { shards, failures })
    }

    async fn notify_peer(&self, peer: &str, request: &ViewChangeRequest) -> KvResult<()> {
        let response = self
            .node
            .forwarder
            .send_json(Method::PUT, peer, ENDPOINT_VIEW_CHANGE, request)
            .await?;
        if !response.status().is_success() {
            return Err(KvError::PeerRejected {
                address: peer.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn trigger_redistribution(&self, peer: &str) -> Vec<MigrationFailure> {
        let failure = |reason: String| MigrationFailure {
            address: peer.to_string(),
            key: None,
            reason,
        };

        let response = match self
            .node
            .forwarder
            .send_json(Method::PUT, peer, ENDPOINT_KEY_DISTRIBUTE, &())
            .await
        {
            Ok(response) => response,
            Err(e) => return vec![failure(e.to_string())],
        };

        let status = response.status();
        match response.json::<KeyDistributeResponse>().await {
            Ok(_) if status.is_success() => Vec::new(),
            Ok(body) if !body.failures.is_empty() => body.failures,
            Ok(body) => vec![failure(body.message)],
            Err(e) => vec![failure(format!(
                "unreadable redistribution answer ({}): {}",
                status, e
            ))],
        }
    }

    async fn key_count_of(&self, address: &str) -> KvResult<usize> {
        if address == self.node.address {
            return Ok(self.node.key_count().await);
        }

        let unreachable = || KvError::PeerUnreachable {
            address: address.to_string(),
        };
        let response = self
            .node
            .forwarder
            .get(address, ENDPOINT_KEY_COUNT)
            .await?;
        if !response.status().is_success() {
            return Err(KvError::PeerRejected {
                address: address.to_string(),
                status: response.status().as_u16(),
            });
        }
        let body: KeyCountResponse = response.json().await.map_err(|_| unreachable())?;
        Ok(body.key_count)
    }
}
