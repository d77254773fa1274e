use super::forwarder::is_forwarded;
use super::protocol::{KeyDistributeResponse, ViewChangeRequest, ViewChangeResponse};
use super::redistribution::{ViewChangeOutcome, ViewManager};

use axum::{
    Extension, Json,
    http::{HeaderMap, StatusCode},
};
use std::sync::Arc;

pub async fn handle_view_change(
    Extension(views): Extension<Arc<ViewManager>>,
    headers: HeaderMap,
    Json(req): Json<ViewChangeRequest>,
) -> (StatusCode, Json<ViewChangeResponse>) {
    match views.change_view(req, is_forwarded(&headers)).await {
        Ok(ViewChangeOutcome::Installed) => (
            StatusCode::OK,
            Json(ViewChangeResponse {
                message: "ok".to_string(),
                error: None,
                shards: Vec::new(),
                failures: Vec::new(),
            }),
        ),
        Ok(ViewChangeOutcome::Coordinated { shards, failures }) if failures.is_empty() => (
            StatusCode::OK,
            Json(ViewChangeResponse {
                message: "View change successful".to_string(),
                error: None,
                shards,
                failures,
            }),
        ),
        Ok(ViewChangeOutcome::Coordinated { shards, failures }) => {
            let mut unresponsive: Vec<&str> = Vec::new();
            for failure in &failures {
                if !unresponsive.contains(&failure.address.as_str()) {
                    unresponsive.push(&failure.address);
                }
            }
            let error = format!("View change incomplete on node(s) {}", unresponsive.join(", "));
            (
                StatusCode::BAD_REQUEST,
                Json(ViewChangeResponse {
                    message: "Error in view change".to_string(),
                    error: Some(error),
                    shards,
                    failures,
                }),
            )
        }
        Err(e) => {
            tracing::warn!("Rejected view change: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(ViewChangeResponse {
                    message: "Error in view change".to_string(),
                    error: Some(e.to_string()),
                    shards: Vec::new(),
                    failures: Vec::new(),
                }),
            )
        }
    }
}

pub async fn handle_key_distribute(
    Extension(views): Extension<Arc<ViewManager>>,
) -> (StatusCode, Json<KeyDistributeResponse>) {
    let report = views.redistribute_local_keys().await;

    if report.failures.is_empty() {
        (
            StatusCode::OK,
            Json(KeyDistributeResponse {
                message: "ok".to_string(),
                moved: report.moved,
                failures: Vec::new(),
            }),
        )
    } else {
        let message = report
            .failures
            .iter()
            .map(|failure| match &failure.key {
                Some(key) => format!("Node {} did not accept key {}", failure.address, key),
                None => failure.reason.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        (
            StatusCode::BAD_REQUEST,
            Json(KeyDistributeResponse {
                message,
                moved: report.moved,
                failures: report.failures,
            }),
        )
    }
}
