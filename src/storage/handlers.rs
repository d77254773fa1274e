use axum::{
    Json,
    body::Bytes,
    extract::{Extension, Path},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::memory::Value;
use super::partitioner::Route;
use super::protocol::{
    ErrorResponse, KeyCountResponse, KeyResponse, PutRequest, PutResponse, ShardInfoResponse,
};
use crate::cluster::forwarder::is_forwarded;
use crate::error::{KvError, validate_key};
use crate::membership::types::View;
use crate::node::KvNode;

/// Result of routing a request under the state lock.
enum Dispatch<T> {
    Local(T),
    Forward(String),
}

// Bodies that are not JSON, or lack a usable "value", count as a missing value.
fn parse_value(body: &Bytes) -> Option<Value> {
    serde_json::from_slice::<PutRequest>(body)
        .ok()
        .and_then(|request| request.value)
}

fn error_response(err: &KvError, method: &Method, does_exist: Option<bool>) -> Response {
    (
        err.status(),
        Json(ErrorResponse {
            does_exist,
            error: err.to_string(),
            message: format!("Error in {}", method),
        }),
    )
        .into_response()
}

/// Forwards a client request to `target`. A request that was already forwarded is
/// answered with 421 instead, so a disagreement about placement can never loop.
async fn forward_or_reject(
    node: &KvNode,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
    target: &str,
    does_exist: Option<bool>,
) -> Response {
    if is_forwarded(headers) {
        tracing::warn!(
            "Peer sent {} {} but the key belongs to {}",
            method,
            uri.path(),
            target
        );
        return error_response(&KvError::Misdirected, &method, does_exist);
    }
    node.forwarder.forward(method, uri, headers, body, target).await
}

pub async fn handle_put_key(
    Extension(node): Extension<Arc<KvNode>>,
    Path(key): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = validate_key(&key) {
        tracing::warn!("Rejected PUT: {}", e);
        return error_response(&e, &method, None);
    }
    let value = parse_value(&body);

    let dispatch = {
        let mut state = node.state.lock().await;
        match state.partitioner.route(&key) {
            Route::Local { .. } => Dispatch::Local(match value {
                Some(value) => state.local_put(&key, value),
                None => Err(KvError::MissingValue),
            }),
            Route::Forward { address, .. } => Dispatch::Forward(address),
        }
    };

    match dispatch {
        Dispatch::Local(Ok(replaced)) => {
            tracing::debug!("PUT {} (replaced={})", key, replaced);
            let message = if replaced {
                "Updated successfully"
            } else {
                "Added successfully"
            };
            (
                StatusCode::OK,
                Json(PutResponse {
                    message: message.to_string(),
                    replaced,
                    address: is_forwarded(&headers).then(|| node.address.clone()),
                }),
            )
                .into_response()
        }
        Dispatch::Local(Err(e)) => {
            tracing::warn!("Rejected PUT {}: {}", key, e);
            error_response(&e, &method, None)
        }
        Dispatch::Forward(target) => {
            forward_or_reject(&node, method, &uri, &headers, body, &target, None).await
        }
    }
}

pub async fn handle_get_key(
    Extension(node): Extension<Arc<KvNode>>,
    Path(key): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let dispatch = {
        let state = node.state.lock().await;
        match state.partitioner.route(&key) {
            Route::Local { .. } => {
                Dispatch::Local(state.local_get(&key).map(|record| record.value.clone()))
            }
            Route::Forward { address, .. } => Dispatch::Forward(address),
        }
    };

    match dispatch {
        Dispatch::Local(Ok(value)) => (
            StatusCode::OK,
            Json(KeyResponse {
                does_exist: true,
                message: "Retrieved successfully".to_string(),
                value,
                address: is_forwarded(&headers).then(|| node.address.clone()),
            }),
        )
            .into_response(),
        Dispatch::Local(Err(e)) => error_response(&e, &method, Some(false)),
        Dispatch::Forward(target) => {
            forward_or_reject(&node, method, &uri, &headers, Bytes::new(), &target, Some(false))
                .await
        }
    }
}

pub async fn handle_delete_key(
    Extension(node): Extension<Arc<KvNode>>,
    Path(key): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let dispatch = {
        let mut state = node.state.lock().await;
        match state.partitioner.route(&key) {
            Route::Local { .. } => Dispatch::Local(state.local_delete(&key)),
            Route::Forward { address, .. } => Dispatch::Forward(address),
        }
    };

    match dispatch {
        Dispatch::Local(Ok(())) => {
            tracing::debug!("DELETE {}", key);
            (
                StatusCode::OK,
                Json(KeyResponse {
                    does_exist: true,
                    message: "Deleted successfully".to_string(),
                    value: None,
                    address: is_forwarded(&headers).then(|| node.address.clone()),
                }),
            )
                .into_response()
        }
        Dispatch::Local(Err(e)) => error_response(&e, &method, Some(false)),
        Dispatch::Forward(target) => {
            forward_or_reject(&node, method, &uri, &headers, body, &target, Some(false)).await
        }
    }
}

pub async fn handle_key_count(
    Extension(node): Extension<Arc<KvNode>>,
) -> (StatusCode, Json<KeyCountResponse>) {
    let state = node.state.lock().await;
    (
        StatusCode::OK,
        Json(KeyCountResponse {
            message: "Key count retrieved successfully".to_string(),
            key_count: state.store.count(),
            shard_id: state.partitioner.keyshard_id(),
        }),
    )
}

pub async fn handle_shard_info(
    Extension(node): Extension<Arc<KvNode>>,
    Path(raw_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let dispatch = {
        let state = node.state.lock().await;
        let partitioner = &state.partitioner;
        match raw_id
            .parse::<usize>()
            .ok()
            .filter(|id| *id < partitioner.num_shards())
        {
            None => {
                return (
                    StatusCode::OK,
                    Json(ShardInfoResponse {
                        message: "Shard does not exist".to_string(),
                        ..Default::default()
                    }),
                )
                    .into_response();
            }
            Some(id) if partitioner.keyshard_id() == Some(id) => {
                Dispatch::Local(ShardInfoResponse {
                    message: "Shard information retrieved successfully".to_string(),
                    shard_id: Some(id),
                    key_count: Some(state.store.count()),
                    replicas: Some(
                        partitioner
                            .shard_members(id)
                            .into_iter()
                            .map(|(_, address)| address)
                            .collect(),
                    ),
                    causal_context: Some(state.local_row()),
                })
            }
            Some(id) => Dispatch::Forward(
                partitioner
                    .owner_address(id)
                    .unwrap_or_default()
                    .to_string(),
            ),
        }
    };

    match dispatch {
        Dispatch::Local(info) => (StatusCode::OK, Json(info)).into_response(),
        Dispatch::Forward(target) => {
            forward_or_reject(&node, method, &uri, &headers, Bytes::new(), &target, None).await
        }
    }
}

pub async fn handle_get_view(Extension(node): Extension<Arc<KvNode>>) -> (StatusCode, Json<View>) {
    (StatusCode::OK, Json(node.view().await))
}
