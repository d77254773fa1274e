use super::protocol::ForwardFailure;
use crate::error::{KvError, KvResult};
use crate::storage::memory::Value;
use crate::storage::protocol::{ENDPOINT_KEYS, PutRequest};

use axum::Json;
use axum::body::Bytes;
use axum::http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::time::Duration;

/// Header marking a request as sent by a peer rather than an end client.
pub const FORWARD_MARKER: &str = "from_node";

pub fn is_forwarded(headers: &HeaderMap) -> bool {
    headers.contains_key(FORWARD_MARKER)
}

/// Relays requests to the node that owns them and carries every other peer call.
pub struct RequestForwarder {
    local_address: String,
    http_client: reqwest::Client,
    timeout: Duration,
}

impl RequestForwarder {
    pub fn new(local_address: &str, http_client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            local_address: local_address.to_string(),
            http_client,
            timeout,
        }
    }

    /// Re-issues a client request against `target` and relays the answer verbatim.
    ///
    /// The forward marker is added unless the request already carries one. When `target`
    /// cannot be reached in time the caller gets a 503 naming it.
    pub async fn forward(
        &self,
        method: Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Bytes,
        target: &str,
    ) -> Response {
        let path = uri
            .path_and_query()
            .map(|path| path.as_str())
            .unwrap_or("/");
        let url = format!("http://{}{}", target, path);

        let mut outgoing = headers.clone();
        for hop_header in [HOST, CONTENT_LENGTH, CONNECTION, TRANSFER_ENCODING] {
            outgoing.remove(hop_header);
        }
        if !outgoing.contains_key(FORWARD_MARKER) {
            if let Ok(marker) = HeaderValue::from_str(&self.local_address) {
                outgoing.insert(FORWARD_MARKER, marker);
            }
        }

        tracing::debug!("Forwarding {} {} to {}", method, path, target);

        let response = self
            .http_client
            .request(method.clone(), url)
            .headers(outgoing)
            .body(body)
            .timeout(self.timeout)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let status = resp.status();
                let content_type = resp.headers().get(CONTENT_TYPE).cloned();
                match resp.bytes().await {
                    Ok(body) => {
                        let mut relayed = (status, body).into_response();
                        if let Some(content_type) = content_type {
                            relayed.headers_mut().insert(CONTENT_TYPE, content_type);
                        }
                        relayed
                    }
                    Err(e) => {
                        tracing::warn!("Lost response body from {}: {}", target, e);
                        unreachable_response(target, &method)
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Failed to forward {} {} to {}: {}", method, path, target, e);
                unreachable_response(target, &method)
            }
        }
    }

    /// Hands a record over to its new owner during redistribution.
    pub async fn put_value(&self, target: &str, key: &str, value: &Value) -> KvResult<()> {
        let unreachable = || KvError::PeerUnreachable {
            address: target.to_string(),
        };

        let mut url =
            reqwest::Url::parse(&format!("http://{}/", target)).map_err(|_| unreachable())?;
        url.path_segments_mut()
            .map_err(|_| unreachable())?
            .pop_if_empty()
            .extend(ENDPOINT_KEYS.trim_matches('/').split('/'))
            .push(key);

        let payload = PutRequest {
            value: Some(value.clone()),
        };
        let response = self
            .http_client
            .put(url)
            .header(FORWARD_MARKER, self.local_address.as_str())
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to hand key {} to {}: {}", key, target, e);
                unreachable()
            })?;

        if !response.status().is_success() {
            return Err(KvError::PeerRejected {
                address: target.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    /// Peer-to-peer JSON call, always marked as coming from this node.
    pub async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        target: &str,
        path: &str,
        payload: &T,
    ) -> KvResult<reqwest::Response> {
        self.http_client
            .request(method, format!("http://{}{}", target, path))
            .header(FORWARD_MARKER, self.local_address.as_str())
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Call to {}{} failed: {}", target, path, e);
                KvError::PeerUnreachable {
                    address: target.to_string(),
                }
            })
    }

    pub async fn get(&self, target: &str, path: &str) -> KvResult<reqwest::Response> {
        self.http_client
            .get(format!("http://{}{}", target, path))
            .header(FORWARD_MARKER, self.local_address.as_str())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Call to {}{} failed: {}", target, path, e);
                KvError::PeerUnreachable {
                    address: target.to_string(),
                }
            })
    }
}

fn unreachable_response(target: &str, method: &Method) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ForwardFailure {
            error: format!("Node {} is down", target),
            message: format!("Error in {}", method),
        }),
    )
        .into_response()
}
