//! Shared test fixtures: mock delivery channels, recording queues, and
//! request builders.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use base64::Engine as _;
use chrono::Utc;
use tokio::sync::Mutex;

use docrelay::channel::{ChannelError, DeliveryChannel};
use docrelay::queue::{EnqueueOptions, QueueError, QueueJob, RetryQueue};
use docrelay::send::{DocumentKind, DocumentMetadata, Recipient, SendDocumentRequest, SendJob};

/// A document message captured by [`MockChannel`].
#[derive(Debug, Clone)]
pub struct SentDoc {
    pub to: String,
    pub media_id: String,
    pub filename: String,
    pub caption: String,
}

/// Scriptable in-memory delivery channel.
pub struct MockChannel {
    pub fail_upload: bool,
    pub fail_send: bool,
    pub sent: Mutex<Vec<SentDoc>>,
    counter: AtomicUsize,
}

impl MockChannel {
    pub fn working() -> Self {
        Self::new(false, false)
    }

    pub fn failing_send() -> Self {
        Self::new(false, true)
    }

    pub fn failing_upload() -> Self {
        Self::new(true, false)
    }

    fn new(fail_upload: bool, fail_send: bool) -> Self {
        Self {
            fail_upload,
            fail_send,
            sent: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DeliveryChannel for MockChannel {
    async fn upload_media(&self, _file: &[u8], _filename: &str) -> Result<String, ChannelError> {
        if self.fail_upload {
            return Err(ChannelError::Api {
                status: 500,
                body: "mock upload failure".to_owned(),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("media-{n}"))
    }

    async fn send_document(
        &self,
        to: &str,
        media_id: &str,
        filename: &str,
        caption: &str,
    ) -> Result<String, ChannelError> {
        if self.fail_send {
            return Err(ChannelError::Api {
                status: 429,
                body: "Rate limit exceeded".to_owned(),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().await.push(SentDoc {
            to: to.to_owned(),
            media_id: media_id.to_owned(),
            filename: filename.to_owned(),
            caption: caption.to_owned(),
        });
        Ok(format!("msg-{n}"))
    }
}

/// A single enqueue call captured by [`RecordingQueue`].
#[derive(Debug, Clone)]
pub struct EnqueueCall {
    pub channel: String,
    pub data: serde_json::Value,
    pub delay_ms: Option<u64>,
    pub attempts: u32,
}

/// Queue that records enqueue calls without storing jobs.
#[derive(Default)]
pub struct RecordingQueue {
    pub calls: Mutex<Vec<EnqueueCall>>,
}

#[async_trait]
impl RetryQueue for RecordingQueue {
    async fn enqueue(
        &self,
        channel: &str,
        data: serde_json::Value,
        opts: EnqueueOptions,
    ) -> Result<String, QueueError> {
        self.calls.lock().await.push(EnqueueCall {
            channel: channel.to_owned(),
            data,
            delay_ms: opts.delay_ms,
            attempts: opts.attempts,
        });
        Ok("job-recorded".to_owned())
    }

    async fn requeue(
        &self,
        _channel: &str,
        _job: QueueJob,
        _delay_ms: u64,
    ) -> Result<(), QueueError> {
        Ok(())
    }

    async fn dequeue(&self, _channel: &str) -> Result<Option<QueueJob>, QueueError> {
        Ok(None)
    }

    async fn length(&self, _channel: &str) -> Result<usize, QueueError> {
        Ok(self.calls.lock().await.len())
    }

    async fn clear(&self, _channel: &str) -> Result<(), QueueError> {
        self.calls.lock().await.clear();
        Ok(())
    }
}

/// Queue whose every operation fails, for infrastructure-fault paths.
pub struct BrokenQueue;

#[async_trait]
impl RetryQueue for BrokenQueue {
    async fn enqueue(
        &self,
        _channel: &str,
        _data: serde_json::Value,
        _opts: EnqueueOptions,
    ) -> Result<String, QueueError> {
        Err(QueueError::Backend("queue connection refused".to_owned()))
    }

    async fn requeue(
        &self,
        _channel: &str,
        _job: QueueJob,
        _delay_ms: u64,
    ) -> Result<(), QueueError> {
        Err(QueueError::Backend("queue connection refused".to_owned()))
    }

    async fn dequeue(&self, _channel: &str) -> Result<Option<QueueJob>, QueueError> {
        Err(QueueError::Backend("queue connection refused".to_owned()))
    }

    async fn length(&self, _channel: &str) -> Result<usize, QueueError> {
        Err(QueueError::Backend("queue connection refused".to_owned()))
    }

    async fn clear(&self, _channel: &str) -> Result<(), QueueError> {
        Err(QueueError::Backend("queue connection refused".to_owned()))
    }
}

/// A request with the given recipient numbers and a small PDF payload.
pub fn request_for(numbers: &[&str]) -> SendDocumentRequest {
    SendDocumentRequest {
        tenant_id: "tenant-1".to_owned(),
        document: b"%PDF-1.4 test document content".to_vec(),
        filename: "invoice-042.pdf".to_owned(),
        recipients: numbers
            .iter()
            .map(|n| Recipient {
                phone_number: (*n).to_owned(),
                name: None,
                client_id: None,
            })
            .collect(),
        custom_message: None,
        metadata: DocumentMetadata {
            id: "doc-042".to_owned(),
            kind: DocumentKind::Invoice,
            size: 31,
            client_id: None,
            created_at: Utc::now(),
        },
    }
}

/// A serialized retry-job payload for the given tenant and number.
pub fn send_job_value(tenant_id: &str, number: &str) -> serde_json::Value {
    let request = request_for(&[number]);
    let job = SendJob {
        tenant_id: tenant_id.to_owned(),
        recipient: request.recipients[0].clone(),
        document: base64::engine::general_purpose::STANDARD.encode(&request.document),
        filename: request.filename,
        custom_message: None,
        metadata: request.metadata,
    };
    serde_json::to_value(&job).expect("job serializes")
}
