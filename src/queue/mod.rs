//! Durable retry queue interface and job envelope.
//!
//! The orchestrator only enqueues; a separate worker dequeues. Semantics are
//! a score-ordered set rather than strict FIFO: score = now + delay (or
//! now − priority when no delay), and a job is invisible to consumers until
//! its scheduled time. Bounded attempts are honored by the consumer-side
//! retry loop, not by the queue itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod memory;

/// Logical channel for deferred document sends.
pub const SEND_QUEUE: &str = "whatsapp_send_queue";

/// Logical channel for inbound webhook retries. Reserved for the webhook
/// consumer, which runs outside this crate; producers share the queue
/// backend and must agree on this name.
pub const WEBHOOK_RETRY_QUEUE: &str = "whatsapp_webhook_queue";

/// Delay before a queued send becomes visible to the worker, in milliseconds.
pub const RETRY_DELAY_MS: u64 = 5000;

/// Maximum delivery attempts for a queued send.
pub const RETRY_ATTEMPTS: u32 = 3;

/// Errors from a retry queue implementation.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Job payload could not be (de)serialized.
    #[error("job serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The queue backend rejected the operation.
    #[error("queue backend error: {0}")]
    Backend(String),
}

/// Scheduling options for [`RetryQueue::enqueue`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EnqueueOptions {
    /// Visibility delay in milliseconds; `None` means immediately due.
    pub delay_ms: Option<u64>,
    /// Maximum attempts the consumer should make.
    pub attempts: u32,
    /// Priority boost for undelayed jobs (higher pops sooner).
    pub priority: Option<u32>,
}

/// A job as stored on and returned from the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJob {
    /// Queue-assigned job identifier.
    pub id: String,
    /// Opaque job payload (serialized by the producer).
    pub data: serde_json::Value,
    /// Attempts made so far; the consumer increments this on failure.
    pub attempts: u32,
    /// Attempt ceiling the consumer must honor.
    pub max_attempts: u32,
    /// Priority the job was enqueued with.
    pub priority: u32,
    /// When the job was enqueued.
    pub created_at: DateTime<Utc>,
    /// Earliest time the job may be dequeued.
    pub scheduled_at: DateTime<Utc>,
}

/// Score-ordered durable job queue.
#[async_trait]
pub trait RetryQueue: Send + Sync {
    /// Add a job to a named channel. Returns the job id.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] if the payload cannot be serialized or the
    /// backend rejects the write.
    async fn enqueue(
        &self,
        channel: &str,
        data: serde_json::Value,
        opts: EnqueueOptions,
    ) -> Result<String, QueueError>;

    /// Put a previously dequeued job back with a new visibility delay,
    /// preserving its attempt count.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] on backend failure.
    async fn requeue(&self, channel: &str, job: QueueJob, delay_ms: u64)
        -> Result<(), QueueError>;

    /// Pop the next due job (scheduled time ≤ now), if any.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] on backend failure.
    async fn dequeue(&self, channel: &str) -> Result<Option<QueueJob>, QueueError>;

    /// Number of jobs on a channel, due or not.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] on backend failure.
    async fn length(&self, channel: &str) -> Result<usize, QueueError>;

    /// Drop every job on a channel.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] on backend failure.
    async fn clear(&self, channel: &str) -> Result<(), QueueError>;
}
