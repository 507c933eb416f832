use std::sync::Arc;
use std::time::{Duration, Instant};

use switchboard_channels::ChatApi;
use switchboard_middleware::{Pipeline, StandardChain, TurnHandler};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::metrics::Metrics;
use crate::queue::Job;

pub type GatewayPipeline = Pipeline<StandardChain<Arc<dyn ChatApi>>>;

/// Drains one queue shard, one turn at a time.
pub struct Worker {
    shard: usize,
    pipeline: Arc<GatewayPipeline>,
    handler: Arc<dyn TurnHandler>,
    metrics: Arc<Metrics>,
    turn_timeout: Duration,
}

impl Worker {
    /// Runs until the token is cancelled or every sender is gone. A turn in
    /// flight at cancellation finishes first.
    pub async fn run(self, mut jobs: mpsc::Receiver<Job>, cancel: CancellationToken) {
        info!(shard = self.shard, "worker started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(shard = self.shard, pending = jobs.len(), "worker shutting down");
                    break;
                }
                job = jobs.recv() => match job {
                    Some(job) => {
                        self.process(job).await;
                    }
                    None => break,
                }
            }
        }
    }

    /// Run one turn and record its outcome label.
    async fn process(&self, job: Job) -> &'static str {
        let category = job.category;
        let activity_type = job.activity.activity_type.as_str();
        let team_id = job.activity.team_id.clone().unwrap_or_else(|| "-".to_string());
        let conversation = job.activity.conversation.clone();
        let started = Instant::now();

        let run = self.pipeline.run(job.activity, job.state, self.handler.as_ref());
        let outcome = match tokio::time::timeout(self.turn_timeout, run).await {
            Ok(Ok(turn)) if turn.halted => "halted",
            Ok(Ok(_)) => "ok",
            Ok(Err(e)) => {
                // Delivery failures were already logged with full context by
                // the sink; this line ties them to the worker.
                warn!(shard = self.shard, %conversation, error = %e, "turn failed");
                "failed"
            }
            Err(_) => {
                error!(
                    shard = self.shard,
                    %conversation,
                    timeout_ms = self.turn_timeout.as_millis() as u64,
                    "turn timed out"
                );
                "timeout"
            }
        };

        self.metrics.activity_processed(
            category,
            activity_type,
            &team_id,
            outcome,
            started.elapsed().as_secs_f64(),
        );
        outcome
    }
}

/// One worker task per shard receiver.
pub fn spawn_workers(
    receivers: Vec<mpsc::Receiver<Job>>,
    pipeline: Arc<GatewayPipeline>,
    handler: Arc<dyn TurnHandler>,
    metrics: Arc<Metrics>,
    turn_timeout: Duration,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    receivers
        .into_iter()
        .enumerate()
        .map(|(shard, jobs)| {
            let worker = Worker {
                shard,
                pipeline: Arc::clone(&pipeline),
                handler: Arc::clone(&handler),
                metrics: Arc::clone(&metrics),
                turn_timeout,
            };
            tokio::spawn(worker.run(jobs, cancel.clone()))
        })
        .collect()
}
