use crate::membership::types::View;
use crate::node::NodeSettings;
use crate::storage::partitioner::PartitionManager;

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Startup configuration, read once.
#[derive(Debug, Clone, Parser)]
#[command(name = "causal-kvs", about = "Causally consistent sharded key-value store node")]
pub struct Config {
    /// Address of this node as it appears in the view (`host:port`).
    #[arg(long, env = "ADDRESS")]
    pub address: String,

    /// Comma-separated, ordered list of every node address.
    #[arg(long, env = "VIEW")]
    pub view: String,

    /// Number of replicas per keyshard.
    #[arg(long = "repl-factor", env = "REPL_FACTOR", default_value_t = 1)]
    pub replication_factor: usize,

    /// Socket the HTTP server binds to.
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:13800")]
    pub listen: SocketAddr,

    #[arg(long, env = "GOSSIP_INTERVAL_SECS", default_value_t = 10)]
    pub gossip_interval_secs: u64,

    /// Timeout of every call to a peer.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 20)]
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn partitioner(&self) -> anyhow::Result<PartitionManager> {
        let view = View::parse(&self.view);
        anyhow::ensure!(
            view.contains(&self.address),
            "address {} is not part of the view {}",
            self.address,
            view
        );
        Ok(PartitionManager::new(
            &self.address,
            view,
            self.replication_factor,
        )?)
    }

    pub fn settings(&self) -> NodeSettings {
        NodeSettings {
            gossip_interval: Duration::from_secs(self.gossip_interval_secs.max(1)),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }
}
