//! Cluster Module Tests
//!
//! ## Test Scopes
//! - **Protocol**: the accepted shapes of a view change body.
//! - **Forwarder**: forward marker detection and the failure answer for a dead target.
//! - **ViewManager**: installation of forwarded views, argument validation and one change
//!   at a time per node.
//!
//! *Note: coordinated view changes across live nodes are covered by `tests/cluster.rs`.*

#[cfg(test)]
mod tests {
    use crate::cluster::forwarder::{FORWARD_MARKER, RequestForwarder, is_forwarded};
    use crate::cluster::protocol::{ForwardFailure, ViewChangeRequest, ViewSpec};
    use crate::cluster::redistribution::{ViewChangeOutcome, ViewManager};
    use crate::error::KvError;
    use crate::membership::types::View;
    use crate::node::{KvNode, NodeSettings};
    use crate::storage::partitioner::PartitionManager;

    use axum::body::{Bytes, to_bytes};
    use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
    use serde_json::json;
    use std::time::Duration;

    fn node(local: &str, view: &str, replication_factor: usize) -> std::sync::Arc<KvNode> {
        let partitioner =
            PartitionManager::new(local, View::parse(view), replication_factor).unwrap();
        KvNode::new(
            partitioner,
            NodeSettings {
                gossip_interval: Duration::from_secs(3600),
                request_timeout: Duration::from_millis(500),
            },
        )
    }

    /// An address nothing listens on.
    async fn dead_address() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);
        address
    }

    // ============================================================
    // PROTOCOL TESTS
    // ============================================================

    #[test]
    fn test_view_spec_accepts_joined_string() {
        let req: ViewChangeRequest =
            serde_json::from_value(json!({"view": "a:1, b:1,c:1"})).unwrap();

        assert!(matches!(req.view, ViewSpec::Joined(_)));
        assert_eq!(req.view.to_view(), View::parse("a:1,b:1,c:1"));
        assert_eq!(req.replication_factor, None);
    }

    #[test]
    fn test_view_spec_accepts_list_and_repl_factor() {
        let req: ViewChangeRequest =
            serde_json::from_value(json!({"view": ["a:1", "b:1"], "repl-factor": 2})).unwrap();

        assert_eq!(req.view.to_view().addresses(), &["a:1", "b:1"]);
        assert_eq!(req.replication_factor, Some(2));
    }

    #[test]
    fn test_view_change_request_omits_absent_repl_factor() {
        let req = ViewChangeRequest {
            view: ViewSpec::Joined("a:1".to_string()),
            replication_factor: None,
        };

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body, json!({"view": "a:1"}));
    }

    // ============================================================
    // FORWARDER TESTS
    // ============================================================

    #[test]
    fn test_is_forwarded() {
        let mut headers = HeaderMap::new();
        assert!(!is_forwarded(&headers));

        headers.insert(FORWARD_MARKER, HeaderValue::from_static("a:1"));
        assert!(is_forwarded(&headers));
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(KvError::KeyTooLong { len: 51 }.status(), StatusCode::CREATED);
        assert_eq!(KvError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(KvError::Misdirected.status(), StatusCode::MISDIRECTED_REQUEST);
        assert_eq!(
            KvError::StalePeer {
                sender: "b:1".to_string()
            }
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            KvError::PeerUnreachable {
                address: "a:1".to_string()
            }
            .to_string(),
            "Node a:1 is down"
        );
    }

    #[tokio::test]
    async fn test_forward_to_dead_node_is_503() {
        let target = dead_address().await;
        let forwarder =
            RequestForwarder::new("a:1", reqwest::Client::new(), Duration::from_millis(500));
        let uri: Uri = "/kv-store/keys/x".parse().unwrap();

        let response = forwarder
            .forward(Method::GET, &uri, &HeaderMap::new(), Bytes::new(), &target)
            .await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let failure: ForwardFailure = serde_json::from_slice(&body).unwrap();
        assert_eq!(failure.error, format!("Node {} is down", target));
        assert_eq!(failure.message, "Error in GET");
    }

    #[tokio::test]
    async fn test_put_value_to_dead_node() {
        let target = dead_address().await;
        let forwarder =
            RequestForwarder::new("a:1", reqwest::Client::new(), Duration::from_millis(500));

        let result = forwarder.put_value(&target, "x", &json!(1)).await;

        assert_eq!(result, Err(KvError::PeerUnreachable { address: target }));
    }

    // ============================================================
    // VIEW MANAGER TESTS
    // ============================================================

    #[tokio::test]
    async fn test_forwarded_view_change_only_installs() {
        let node = node("a:1", "a:1", 1);
        let views = ViewManager::new(node.clone());
        node.state.lock().await.local_put("x", json!(1)).unwrap();

        let request = ViewChangeRequest {
            view: ViewSpec::List(vec!["a:1".to_string(), "b:1".to_string()]),
            replication_factor: None,
        };
        let outcome = views.change_view(request, true).await.unwrap();

        assert_eq!(outcome, ViewChangeOutcome::Installed);
        assert_eq!(node.view().await, View::parse("a:1,b:1"));
        let state = node.state.lock().await;
        assert_eq!(state.partitioner.num_shards(), 2);
        // No migration happens on a forwarded request.
        assert!(state.store.record("x").is_some());
    }

    #[tokio::test]
    async fn test_view_change_keeps_replication_factor() {
        let node = node("a:1", "a:1,b:1", 2);
        let views = ViewManager::new(node.clone());

        views
            .install(View::parse("a:1,b:1,c:1,d:1"), None)
            .await
            .unwrap();

        let state = node.state.lock().await;
        assert_eq!(state.partitioner.replication_factor(), 2);
        assert_eq!(state.partitioner.num_shards(), 2);
    }

    #[tokio::test]
    async fn test_invalid_view_change_is_rejected() {
        let node = node("a:1", "a:1,b:1", 1);
        let views = ViewManager::new(node.clone());

        let empty = ViewChangeRequest {
            view: ViewSpec::Joined(" ".to_string()),
            replication_factor: None,
        };
        assert!(matches!(
            views.change_view(empty, false).await,
            Err(KvError::InvalidView(_))
        ));

        let uneven = ViewChangeRequest {
            view: ViewSpec::Joined("a:1,b:1,c:1".to_string()),
            replication_factor: Some(2),
        };
        assert!(matches!(
            views.change_view(uneven, true).await,
            Err(KvError::InvalidView(_))
        ));

        // A rejected change leaves the installed view alone.
        assert_eq!(node.view().await, View::parse("a:1,b:1"));
    }

    #[tokio::test]
    async fn test_install_clears_acks() {
        let node = node("a:1", "a:1,b:1", 2);
        let views = ViewManager::new(node.clone());
        node.acks.record(1, vec![3, 1]);

        views.install(View::parse("a:1,b:1"), None).await.unwrap();

        assert!(node.acks.is_empty());
    }

    #[tokio::test]
    async fn test_redistribution_with_nothing_misplaced() {
        let node = node("a:1", "a:1", 1);
        let views = ViewManager::new(node.clone());
        {
            let mut state = node.state.lock().await;
            state.local_put("x", json!(1)).unwrap();
            state.local_put("y", json!(2)).unwrap();
        }

        let report = views.redistribute_local_keys().await;

        assert_eq!(report.moved, 0);
        assert!(report.failures.is_empty());
        assert_eq!(node.key_count().await, 2);
    }

    #[tokio::test]
    async fn test_failed_migration_keeps_the_key() {
        let target = dead_address().await;
        let view = format!("a:1,{}", target);
        let node = node("a:1", "a:1", 1);
        let views = ViewManager::new(node.clone());
        {
            let mut state = node.state.lock().await;
            for i in 0..10 {
                state.local_put(&format!("k{}", i), json!(i)).unwrap();
            }
        }

        views.install(View::parse(&view), None).await.unwrap();
        let report = views.redistribute_local_keys().await;

        assert_eq!(report.moved, 0);
        assert!(report.failures.iter().all(|f| f.address == target));
        assert_eq!(node.key_count().await, 10, "keys stay until accepted");
    }

    #[tokio::test]
    async fn test_forwarded_change_waits_for_running_change() {
        let node = node("a:1", "a:1", 1);
        let views = std::sync::Arc::new(ViewManager::new(node.clone()));
        let running = views.coordinator.lock().await;

        let pending = tokio::spawn({
            let views = views.clone();
            async move {
                let request = ViewChangeRequest {
                    view: ViewSpec::Joined("a:1,b:1".to_string()),
                    replication_factor: None,
                };
                views.change_view(request, true).await
            }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(node.view().await, View::parse("a:1"), "installed under a running change");

        drop(running);
        let outcome = pending.await.unwrap().unwrap();

        assert_eq!(outcome, ViewChangeOutcome::Installed);
        assert_eq!(node.view().await, View::parse("a:1,b:1"));
    }
}
