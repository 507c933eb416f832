use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health: liveness probe, returns server metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "git_sha": env!("SWITCHBOARD_GIT_SHA"),
        "dedup_entries": state.classifier.deduplicator().len(),
        "queue_shards": state.queue.shard_count(),
        "dry_run": state.dry_run,
    }))
}
