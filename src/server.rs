use crate::cluster::handlers::{handle_key_distribute, handle_view_change};
use crate::cluster::protocol::{ENDPOINT_KEY_DISTRIBUTE, ENDPOINT_VIEW_CHANGE};
use crate::cluster::redistribution::ViewManager;
use crate::gossip::handlers::{handle_ack, handle_gossip};
use crate::gossip::protocol::{ENDPOINT_ACK, ENDPOINT_GOSSIP};
use crate::gossip::service::GossipService;
use crate::node::KvNode;
use crate::storage::handlers::*;
use crate::storage::protocol::{ENDPOINT_GET_VIEW, ENDPOINT_KEY_COUNT, ENDPOINT_KEYS, ENDPOINT_SHARDS};

use axum::{
    Router,
    extract::Extension,
    routing::{get, put},
};
use std::sync::Arc;

/// HTTP surface of a node: the client API plus the internal peer endpoints.
pub fn build_router(node: Arc<KvNode>, gossip: Arc<GossipService>) -> Router {
    let views = Arc::new(ViewManager::new(node.clone()));

    Router::new()
        .route(
            &format!("{}/:key", ENDPOINT_KEYS),
            put(handle_put_key)
                .get(handle_get_key)
                .delete(handle_delete_key),
        )
        .route(ENDPOINT_KEY_COUNT, get(handle_key_count))
        .route(&format!("{}/:id", ENDPOINT_SHARDS), get(handle_shard_info))
        .route(ENDPOINT_GET_VIEW, get(handle_get_view))
        .route(ENDPOINT_VIEW_CHANGE, put(handle_view_change))
        .route(ENDPOINT_KEY_DISTRIBUTE, put(handle_key_distribute))
        .route(ENDPOINT_GOSSIP, put(handle_gossip))
        .route(&format!("{}/:index", ENDPOINT_ACK), put(handle_ack))
        .layer(Extension(node))
        .layer(Extension(gossip))
        .layer(Extension(views))
}
