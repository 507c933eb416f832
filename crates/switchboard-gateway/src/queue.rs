//! Sharded hand-off from the request path to the turn workers.
//!
//! A conversation always hashes to the same shard and each shard has one
//! worker, so turns within a conversation run in arrival order while
//! different conversations run in parallel.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use switchboard_core::{Activity, TurnState};
use thiserror::Error;
use tokio::sync::mpsc;

/// One unit of work for a worker.
#[derive(Debug)]
pub struct Job {
    pub activity: Activity,
    pub state: TurnState,
    /// Ingestion category (`event`, `interaction`, `command`), for metrics.
    pub category: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("shard {shard} is full")]
    Full { shard: usize },
    #[error("shard {shard} is closed")]
    Closed { shard: usize },
}

impl EnqueueError {
    pub fn reason(&self) -> &'static str {
        match self {
            EnqueueError::Full { .. } => "full",
            EnqueueError::Closed { .. } => "closed",
        }
    }
}

#[derive(Clone)]
pub struct ActivityQueue {
    shards: Vec<mpsc::Sender<Job>>,
}

impl ActivityQueue {
    /// Create `shards` bounded channels. The receivers go to the workers.
    pub fn new(shards: usize, capacity: usize) -> (Self, Vec<mpsc::Receiver<Job>>) {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..shards.max(1))
            .map(|_| mpsc::channel(capacity.max(1)))
            .unzip();
        (Self { shards: senders }, receivers)
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn shard_for(&self, conversation: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        conversation.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    /// Never waits: a full shard is reported, not awaited, so the webhook ack
    /// stays fast.
    pub fn enqueue(&self, job: Job) -> Result<usize, EnqueueError> {
        let shard = self.shard_for(job.activity.conversation.as_str());
        match self.shards[shard].try_send(job) {
            Ok(()) => Ok(shard),
            Err(mpsc::error::TrySendError::Full(_)) => Err(EnqueueError::Full { shard }),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(EnqueueError::Closed { shard }),
        }
    }
}
