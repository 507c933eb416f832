//! Prometheus metrics for ingestion and turn processing.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `switchboard_webhook_received_total` | Counter | `category`, `event_type`, `team_id`, `disposition`, `integration`, `retry` |
//! | `switchboard_activity_processed_total` | Counter | `category`, `activity_type`, `team_id`, `outcome` |
//! | `switchboard_activity_process_duration_seconds` | Histogram | `category`, `activity_type` |
//! | `switchboard_queue_rejected_total` | Counter | `category`, `reason` |

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Longest label value kept. This bounds the size of a label, not the number
/// of series: `team_id` and `event_type` come from the payload, so a public
/// endpoint should run with `slack.signing_secret` set.
pub const MAX_LABEL_VALUE_LEN: usize = 64;

const PROCESS_DURATION_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    Encoding(String),
}

/// Labels for one inbound request.
#[derive(Debug, Clone, Copy)]
pub struct ReceivedLabels<'a> {
    pub category: &'a str,
    pub event_type: &'a str,
    pub team_id: &'a str,
    pub disposition: &'a str,
    pub integration: &'a str,
    pub retry: bool,
}

pub struct Metrics {
    registry: Registry,
    webhook_received: CounterVec,
    activity_processed: CounterVec,
    process_duration: HistogramVec,
    queue_rejected: CounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let webhook_received = CounterVec::new(
            Opts::new(
                "switchboard_webhook_received_total",
                "Inbound webhook requests by category and disposition",
            ),
            &["category", "event_type", "team_id", "disposition", "integration", "retry"],
        )?;
        registry.register(Box::new(webhook_received.clone()))?;

        let activity_processed = CounterVec::new(
            Opts::new(
                "switchboard_activity_processed_total",
                "Turns run through the middleware pipeline, by outcome",
            ),
            &["category", "activity_type", "team_id", "outcome"],
        )?;
        registry.register(Box::new(activity_processed.clone()))?;

        let process_duration = HistogramVec::new(
            HistogramOpts::new(
                "switchboard_activity_process_duration_seconds",
                "Wall time of one turn, from dequeue to last delivery",
            )
            .buckets(PROCESS_DURATION_BUCKETS.to_vec()),
            &["category", "activity_type"],
        )?;
        registry.register(Box::new(process_duration.clone()))?;

        let queue_rejected = CounterVec::new(
            Opts::new(
                "switchboard_queue_rejected_total",
                "Activities dropped because their worker shard was full or closed",
            ),
            &["category", "reason"],
        )?;
        registry.register(Box::new(queue_rejected.clone()))?;

        Ok(Self {
            registry,
            webhook_received,
            activity_processed,
            process_duration,
            queue_rejected,
        })
    }

    pub fn webhook_received(&self, labels: ReceivedLabels<'_>) {
        self.webhook_received
            .with_label_values(&[
                truncate_label(labels.category),
                truncate_label(labels.event_type),
                truncate_label(labels.team_id),
                truncate_label(labels.disposition),
                truncate_label(labels.integration),
                if labels.retry { "true" } else { "false" },
            ])
            .inc();
    }

    pub fn activity_processed(
        &self,
        category: &str,
        activity_type: &str,
        team_id: &str,
        outcome: &str,
        elapsed_secs: f64,
    ) {
        let category = truncate_label(category);
        let activity_type = truncate_label(activity_type);
        self.activity_processed
            .with_label_values(&[category, activity_type, truncate_label(team_id), truncate_label(outcome)])
            .inc();
        self.process_duration
            .with_label_values(&[category, activity_type])
            .observe(elapsed_secs);
    }

    pub fn queue_rejected(&self, category: &str, reason: &str) {
        self.queue_rejected
            .with_label_values(&[truncate_label(category), truncate_label(reason)])
            .inc();
    }

    #[cfg(test)]
    pub fn received_count(&self, category: &str, disposition: &str) -> f64 {
        use prometheus::core::Collector;
        self.webhook_received
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .filter(|m| {
                let labels = m.get_label();
                let has = |name: &str, value: &str| {
                    labels.iter().any(|l| l.get_name() == name && l.get_value() == value)
                };
                has("category", category) && has("disposition", disposition)
            })
            .map(|m| m.get_counter().get_value())
            .sum()
    }

    /// Prometheus text exposition.
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }
}

/// Cut a label value at a char boundary no later than `MAX_LABEL_VALUE_LEN`.
fn truncate_label(value: &str) -> &str {
    if value.len() <= MAX_LABEL_VALUE_LEN {
        return value;
    }
    let mut end = MAX_LABEL_VALUE_LEN;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
