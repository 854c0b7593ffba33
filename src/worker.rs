//! Retry queue consumer.
//!
//! Pops due send jobs, re-attempts delivery directly against the tenant's
//! channel, and re-enqueues with exponential backoff while attempts remain.
//! Attempt accounting lives here, not in the queue: the queue only hides
//! jobs until their scheduled time.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use tracing::{debug, info, warn};

use crate::channel::registry::ChannelRegistry;
use crate::queue::{QueueError, QueueJob, RetryQueue, SEND_QUEUE};
use crate::send::{caption_for, SendDocumentRequest, SendJob};

/// Default sleep between polls when the queue is empty, in milliseconds.
const IDLE_POLL_MS: u64 = 5000;

/// Sleep between drain iterations while waiting for delayed jobs.
const DRAIN_POLL_MS: u64 = 250;

/// Consumes the send retry queue for every registered tenant.
pub struct RetryWorker {
    registry: Arc<ChannelRegistry>,
    queue: Arc<dyn RetryQueue>,
    idle_poll: Duration,
}

impl RetryWorker {
    /// Wire a worker from the tenant channel registry and the shared queue,
    /// polling at the default interval.
    pub fn new(registry: Arc<ChannelRegistry>, queue: Arc<dyn RetryQueue>) -> Self {
        Self::with_poll_interval(registry, queue, Duration::from_millis(IDLE_POLL_MS))
    }

    /// Wire a worker with an explicit idle poll interval
    /// (`[worker] poll_interval_secs` in the config file).
    pub fn with_poll_interval(
        registry: Arc<ChannelRegistry>,
        queue: Arc<dyn RetryQueue>,
        idle_poll: Duration,
    ) -> Self {
        Self {
            registry,
            queue,
            idle_poll,
        }
    }

    /// Process at most one due job. Returns whether a job was processed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] if the queue backend fails; job-level delivery
    /// failures are handled internally (re-enqueue or permanent drop).
    pub async fn run_once(&self) -> Result<bool, QueueError> {
        let Some(job) = self.queue.dequeue(SEND_QUEUE).await? else {
            return Ok(false);
        };
        self.process_job(job).await;
        Ok(true)
    }

    /// Poll the queue until cancelled, sleeping while idle.
    pub async fn run(&self) {
        info!(idle_poll_secs = self.idle_poll.as_secs(), "retry worker started");
        loop {
            match self.run_once().await {
                Ok(true) => {}
                Ok(false) => {
                    tokio::time::sleep(self.idle_poll).await;
                }
                Err(e) => {
                    warn!(error = %e, "queue poll failed");
                    tokio::time::sleep(self.idle_poll).await;
                }
            }
        }
    }

    /// Process jobs until the queue is empty, waiting out visibility delays.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] if the queue backend fails.
    pub async fn drain(&self) -> Result<(), QueueError> {
        while self.queue.length(SEND_QUEUE).await? > 0 {
            if !self.run_once().await? {
                tokio::time::sleep(std::time::Duration::from_millis(DRAIN_POLL_MS)).await;
            }
        }
        Ok(())
    }

    /// Attempt one job; on failure either re-enqueue with backoff or drop it
    /// as permanently failed.
    async fn process_job(&self, job: QueueJob) {
        debug!(job_id = %job.id, attempts = job.attempts, "processing retry job");

        let send_job: SendJob = match serde_json::from_value(job.data.clone()) {
            Ok(j) => j,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "dropping malformed job payload");
                return;
            }
        };

        match self.attempt(&send_job).await {
            Ok(message_id) => {
                info!(
                    job_id = %job.id,
                    message_id,
                    recipient = %send_job.recipient.phone_number,
                    "queued send delivered"
                );
            }
            Err(error) => {
                let attempts = job.attempts.saturating_add(1);
                if attempts < job.max_attempts {
                    self.requeue(job, attempts, &error).await;
                } else {
                    warn!(
                        job_id = %job.id,
                        attempts,
                        %error,
                        recipient = %send_job.recipient.phone_number,
                        "job failed permanently"
                    );
                }
            }
        }
    }

    /// One direct delivery attempt, bypassing the orchestrator's queue
    /// fallback so a failing job cannot fork into two.
    async fn attempt(&self, send_job: &SendJob) -> Result<String, String> {
        let channel = self
            .registry
            .get(&send_job.tenant_id)
            .ok_or_else(|| format!("no channel configured for tenant {}", send_job.tenant_id))?;

        let validation = crate::phone::validate_phone_number(&send_job.recipient.phone_number);
        let to = validation
            .formatted_number
            .ok_or_else(|| validation.error.unwrap_or_else(|| "invalid number".to_owned()))?;

        let document = base64::engine::general_purpose::STANDARD
            .decode(&send_job.document)
            .map_err(|e| format!("document decode failed: {e}"))?;

        let request = SendDocumentRequest {
            tenant_id: send_job.tenant_id.clone(),
            document,
            filename: send_job.filename.clone(),
            recipients: vec![send_job.recipient.clone()],
            custom_message: send_job.custom_message.clone(),
            metadata: send_job.metadata.clone(),
        };

        let media_id = channel
            .upload_media(&request.document, &request.filename)
            .await
            .map_err(|e| e.to_string())?;
        channel
            .send_document(&to, &media_id, &request.filename, &caption_for(&request))
            .await
            .map_err(|e| e.to_string())
    }

    /// Re-enqueue a failed job with `2^attempts` seconds of backoff.
    async fn requeue(&self, job: QueueJob, attempts: u32, error: &str) {
        let backoff_ms = 2u64.saturating_pow(attempts).saturating_mul(1000);
        debug!(job_id = %job.id, attempts, backoff_ms, error, "scheduling retry");

        let mut retried = job;
        retried.attempts = attempts;
        if let Err(e) = self.queue.requeue(SEND_QUEUE, retried, backoff_ms).await {
            warn!(error = %e, "failed to re-enqueue job, dropping");
        }
    }
}
