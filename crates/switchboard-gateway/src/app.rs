use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use switchboard_core::config::{SwitchboardConfig, DEFAULT_EVENTS_PATH, MAX_PAYLOAD_BYTES};
use switchboard_ingest::{Classifier, Deduplicator};
use tokio::sync::mpsc;
use tracing::warn;

use crate::metrics::Metrics;
use crate::queue::{ActivityQueue, Job};
use crate::redact::Redactor;
use crate::signature::SignatureVerifier;

/// Central shared state, passed as `Arc<AppState>` to all axum handlers.
pub struct AppState {
    pub config: SwitchboardConfig,
    /// Holds the deduplicator: the only state shared across requests.
    pub classifier: Classifier,
    pub queue: ActivityQueue,
    pub metrics: Arc<Metrics>,
    pub redactor: Redactor,
    /// Present when `slack.signing_secret` is configured.
    pub verifier: Option<SignatureVerifier>,
    /// Outbound calls are recorded, not sent.
    pub dry_run: bool,
}

impl AppState {
    /// Builds the request-path state. The returned receivers feed the
    /// workers, one per queue shard.
    pub fn new(
        config: SwitchboardConfig,
        metrics: Arc<Metrics>,
        redactor: Redactor,
        dry_run: bool,
    ) -> (Self, Vec<mpsc::Receiver<Job>>) {
        let dedup = Deduplicator::in_memory(
            Duration::from_secs(config.dedup.ttl_secs),
            config.dedup.capacity,
        );
        let classifier = Classifier::new(&config.events, dedup);
        let (queue, receivers) =
            ActivityQueue::new(config.worker.shards, config.worker.queue_capacity);
        let verifier = config
            .slack
            .signing_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .map(SignatureVerifier::new);

        let state = Self {
            config,
            classifier,
            queue,
            metrics,
            redactor,
            verifier,
            dry_run,
        };
        (state, receivers)
    }
}

/// Assemble the full axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let events_path = match state.config.gateway.events_path.as_str() {
        path if path.starts_with('/') => path.to_string(),
        other => {
            warn!(path = other, "gateway.events_path must start with '/', using default");
            DEFAULT_EVENTS_PATH.to_string()
        }
    };

    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/metrics", get(crate::http::metrics::metrics_handler))
        .route(&events_path, post(crate::http::events::events_handler))
        .layer(DefaultBodyLimit::max(MAX_PAYLOAD_BYTES))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
