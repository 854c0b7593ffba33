//! In-process score-ordered queue.
//!
//! Mirrors the production backend's sorted-set semantics: each job carries a
//! score of `now + delay` (or `now − priority` when undelayed) and dequeue
//! pops the lowest-scored job whose score is ≤ now. Used by the CLI and by
//! tests; production deployments point the same trait at a shared backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{EnqueueOptions, QueueError, QueueJob, RetryQueue};

/// A scored entry on one channel.
struct ScoredJob {
    score: i64,
    job: QueueJob,
}

/// In-memory [`RetryQueue`] implementation.
#[derive(Default)]
pub struct MemoryQueue {
    channels: Mutex<HashMap<String, Vec<ScoredJob>>>,
}

impl MemoryQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RetryQueue for MemoryQueue {
    async fn enqueue(
        &self,
        channel: &str,
        data: serde_json::Value,
        opts: EnqueueOptions,
    ) -> Result<String, QueueError> {
        let now = Utc::now();
        let now_ms = now.timestamp_millis();

        let delay_ms = opts.delay_ms.and_then(|d| i64::try_from(d).ok());
        let score = match delay_ms {
            Some(d) => now_ms.saturating_add(d),
            None => now_ms.saturating_sub(i64::from(opts.priority.unwrap_or(0))),
        };
        let scheduled_at = delay_ms
            .and_then(|d| now.checked_add_signed(Duration::milliseconds(d)))
            .unwrap_or(now);

        let job = QueueJob {
            id: format!("job-{}", Uuid::new_v4()),
            data,
            attempts: 0,
            max_attempts: opts.attempts,
            priority: opts.priority.unwrap_or(0),
            created_at: now,
            scheduled_at,
        };
        let id = job.id.clone();

        let mut channels = self.channels.lock().await;
        channels
            .entry(channel.to_owned())
            .or_default()
            .push(ScoredJob { score, job });
        Ok(id)
    }

    async fn requeue(
        &self,
        channel: &str,
        mut job: QueueJob,
        delay_ms: u64,
    ) -> Result<(), QueueError> {
        let now = Utc::now();
        let delay = i64::try_from(delay_ms).unwrap_or(i64::MAX);
        let score = now.timestamp_millis().saturating_add(delay);
        job.scheduled_at = now
            .checked_add_signed(Duration::milliseconds(delay))
            .unwrap_or(now);

        let mut channels = self.channels.lock().await;
        channels
            .entry(channel.to_owned())
            .or_default()
            .push(ScoredJob { score, job });
        Ok(())
    }

    async fn dequeue(&self, channel: &str) -> Result<Option<QueueJob>, QueueError> {
        let now_ms = Utc::now().timestamp_millis();
        let mut channels = self.channels.lock().await;
        let Some(jobs) = channels.get_mut(channel) else {
            return Ok(None);
        };

        let due = jobs
            .iter()
            .enumerate()
            .filter(|(_, e)| e.score <= now_ms)
            .min_by_key(|(_, e)| e.score)
            .map(|(i, _)| i);

        Ok(due.map(|i| jobs.remove(i).job))
    }

    async fn length(&self, channel: &str) -> Result<usize, QueueError> {
        let channels = self.channels.lock().await;
        Ok(channels.get(channel).map_or(0, Vec::len))
    }

    async fn clear(&self, channel: &str) -> Result<(), QueueError> {
        let mut channels = self.channels.lock().await;
        channels.remove(channel);
        Ok(())
    }
}
