use super::protocol::{AckRequest, GossipRequest, GossipResponse};
use super::service::GossipService;

use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
};
use std::sync::Arc;

pub async fn handle_gossip(
    Extension(gossip): Extension<Arc<GossipService>>,
    Json(req): Json<GossipRequest>,
) -> (StatusCode, Json<GossipResponse>) {
    let (report, own_index) = match gossip.receive(&req).await {
        Ok(received) => received,
        Err(e) => {
            tracing::warn!("Dropped gossip batch: {}", e);
            return (
                e.status(),
                Json(GossipResponse {
                    applied: 0,
                    discarded: req.entries.len(),
                }),
            );
        }
    };

    // The ack travels on its own request so the sender is not kept waiting on it.
    if let Some(updated_clock) = report.last_context.clone() {
        let gossip = gossip.clone();
        let sender = req.sender.clone();
        let view = req.view.clone();
        tokio::spawn(async move {
            if let Err(e) = gossip.send_ack(&sender, own_index, view, updated_clock).await {
                tracing::warn!("Failed to ack gossip from {}: {}", sender, e);
            }
        });
    }

    (
        StatusCode::OK,
        Json(GossipResponse {
            applied: report.applied,
            discarded: report.discarded,
        }),
    )
}

pub async fn handle_ack(
    Extension(gossip): Extension<Arc<GossipService>>,
    Path(index): Path<usize>,
    Json(req): Json<AckRequest>,
) -> StatusCode {
    match gossip.record_ack(index, req).await {
        Ok(dropped) => {
            tracing::debug!("Ack from view index {} compacted {} entries", index, dropped);
            StatusCode::OK
        }
        Err(e) => {
            tracing::warn!("Dropped ack from view index {}: {}", index, e);
            e.status()
        }
    }
}
