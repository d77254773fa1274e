use causal_kvs::config::Config;
use causal_kvs::gossip::service::GossipService;
use causal_kvs::node::KvNode;
use causal_kvs::server::build_router;

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let partitioner = config.partitioner()?;

    tracing::info!("Starting node {} on {}", config.address, config.listen);
    tracing::info!(
        "View {} with R={}: keyshard {:?}, replica {:?} of {} keyshard(s)",
        partitioner.view(),
        partitioner.replication_factor(),
        partitioner.keyshard_id(),
        partitioner.replica_id(),
        partitioner.num_shards()
    );

    // 1. Shared node state:
    let node = KvNode::new(partitioner, config.settings());

    // 2. Anti-entropy:
    let gossip = Arc::new(GossipService::new(node.clone()));
    let gossip_task = gossip.clone();
    tokio::spawn(async move {
        gossip_task.start().await;
    });

    // 3. HTTP server:
    let app = build_router(node, gossip);
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!("HTTP server listening on {}", config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
