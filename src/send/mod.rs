//! Document send orchestrator.
//!
//! Validates a [`SendDocumentRequest`], fans out sequentially to each
//! recipient, attempts immediate delivery through the tenant's
//! [`DeliveryChannel`], and falls back to the retry queue on failure. The
//! aggregate response carries one result per recipient, in input order.

use std::sync::Arc;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::channel::{ChannelError, DeliveryChannel};
use crate::phone::validate_phone_number;
use crate::queue::{EnqueueOptions, QueueError, RetryQueue, RETRY_ATTEMPTS, RETRY_DELAY_MS, SEND_QUEUE};

/// Hard provider limit on document size: 16 MiB.
pub const MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

/// The kind of business document being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Customer invoice.
    Invoice,
    /// Delivery note (bon de livraison).
    DeliveryNote,
    /// Proforma invoice.
    Proforma,
}

/// Descriptive metadata attached to an outgoing document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Document identifier in the business store.
    pub id: String,
    /// Document kind.
    pub kind: DocumentKind,
    /// Size of the rendered document in bytes.
    pub size: u64,
    /// Owning client record, if any.
    pub client_id: Option<String>,
    /// When the document was generated.
    pub created_at: DateTime<Utc>,
}

/// One recipient of a document send, as given by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Raw phone number, validated during the send.
    pub phone_number: String,
    /// Display name, if known.
    pub name: Option<String>,
    /// Owning client record, if any.
    pub client_id: Option<String>,
}

/// A request to push one document to a list of recipients.
#[derive(Debug, Clone)]
pub struct SendDocumentRequest {
    /// Tenant the send is performed for.
    pub tenant_id: String,
    /// Raw document bytes (already rendered).
    pub document: Vec<u8>,
    /// Filename shown to the recipient.
    pub filename: String,
    /// Ordered recipient list.
    pub recipients: Vec<Recipient>,
    /// Caption override; defaults to `"Document: {filename}"`.
    pub custom_message: Option<String>,
    /// Document metadata, carried into queued jobs.
    pub metadata: DocumentMetadata,
}

/// Delivery outcome for one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    /// Delivered immediately; a provider message id is available.
    Sent,
    /// Immediate delivery failed; a retry job was enqueued.
    Queued,
    /// Rejected (validation) or infrastructure fault; no retry.
    Failed,
}

/// Per-recipient result, emitted in input order.
#[derive(Debug, Clone, Serialize)]
pub struct ContactSendResult {
    /// The recipient as given in the request.
    pub recipient: Recipient,
    /// Whether the document was delivered immediately.
    pub success: bool,
    /// Provider message id, when sent.
    pub message_id: Option<String>,
    /// Error text for queued and failed outcomes.
    pub error: Option<String>,
    /// Final status for this recipient.
    pub status: SendStatus,
}

/// Aggregate response for one send request.
#[derive(Debug, Clone, Serialize)]
pub struct SendDocumentResponse {
    /// True when at least one recipient was sent or queued (or the request
    /// had no recipients).
    pub success: bool,
    /// One result per recipient, in input order.
    pub results: Vec<ContactSendResult>,
    /// Number of recipients whose send was deferred to the retry queue.
    pub queued_count: usize,
    /// Number of recipients that failed outright.
    pub failed_count: usize,
}

/// Queue payload for a deferred send. The document travels base64-encoded so
/// the job is plain JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendJob {
    /// Tenant the job belongs to.
    pub tenant_id: String,
    /// The single recipient this job retries.
    pub recipient: Recipient,
    /// Base64-encoded document bytes.
    pub document: String,
    /// Filename shown to the recipient.
    pub filename: String,
    /// Caption override carried from the original request.
    pub custom_message: Option<String>,
    /// Original document metadata.
    pub metadata: DocumentMetadata,
}

/// Orchestrates document sends for one tenant's channel.
///
/// Stateless per call; the channel and queue are the only shared resources
/// and both are safe for concurrent use.
pub struct DocumentSender {
    channel: Arc<dyn DeliveryChannel>,
    queue: Arc<dyn RetryQueue>,
}

impl DocumentSender {
    /// Wire a sender from a tenant's channel client and the shared queue.
    pub fn new(channel: Arc<dyn DeliveryChannel>, queue: Arc<dyn RetryQueue>) -> Self {
        Self { channel, queue }
    }

    /// Send a document to every recipient in the request.
    ///
    /// Never fails as a whole: business-level problems are reported in the
    /// per-recipient results. An oversized document short-circuits before
    /// any recipient work.
    pub async fn send_document(&self, request: &SendDocumentRequest) -> SendDocumentResponse {
        debug!(
            tenant_id = %request.tenant_id,
            recipients = request.recipients.len(),
            bytes = request.document.len(),
            "sending document"
        );

        if request.document.len() > MAX_DOCUMENT_BYTES {
            let error = format!(
                "File size {} bytes exceeds WhatsApp limit of {MAX_DOCUMENT_BYTES} bytes",
                request.document.len()
            );
            warn!(tenant_id = %request.tenant_id, %error, "rejecting oversized document");
            let results: Vec<ContactSendResult> = request
                .recipients
                .iter()
                .map(|recipient| ContactSendResult {
                    recipient: recipient.clone(),
                    success: false,
                    message_id: None,
                    error: Some(error.clone()),
                    status: SendStatus::Failed,
                })
                .collect();
            let failed_count = results.len();
            return SendDocumentResponse {
                success: false,
                results,
                queued_count: 0,
                failed_count,
            };
        }

        let mut results = Vec::with_capacity(request.recipients.len());
        let mut sent_count: usize = 0;
        let mut queued_count: usize = 0;
        let mut failed_count: usize = 0;

        for recipient in &request.recipients {
            let validation = validate_phone_number(&recipient.phone_number);
            let Some(formatted) = validation.formatted_number else {
                failed_count = failed_count.saturating_add(1);
                results.push(ContactSendResult {
                    recipient: recipient.clone(),
                    success: false,
                    message_id: None,
                    error: validation.error,
                    status: SendStatus::Failed,
                });
                continue;
            };

            match self.send_to_recipient(request, &formatted).await {
                Ok(message_id) => {
                    sent_count = sent_count.saturating_add(1);
                    results.push(ContactSendResult {
                        recipient: recipient.clone(),
                        success: true,
                        message_id: Some(message_id),
                        error: None,
                        status: SendStatus::Sent,
                    });
                }
                Err(send_err) => match self.queue_retry(request, recipient).await {
                    Ok(job_id) => {
                        debug!(job_id, recipient = %formatted, "send deferred to retry queue");
                        queued_count = queued_count.saturating_add(1);
                        results.push(ContactSendResult {
                            recipient: recipient.clone(),
                            success: false,
                            message_id: None,
                            error: Some(send_err.to_string()),
                            status: SendStatus::Queued,
                        });
                    }
                    Err(queue_err) => {
                        warn!(recipient = %formatted, error = %queue_err, "retry enqueue failed");
                        failed_count = failed_count.saturating_add(1);
                        results.push(ContactSendResult {
                            recipient: recipient.clone(),
                            success: false,
                            message_id: None,
                            error: Some(queue_err.to_string()),
                            status: SendStatus::Failed,
                        });
                    }
                },
            }
        }

        info!(
            tenant_id = %request.tenant_id,
            sent = sent_count,
            queued = queued_count,
            failed = failed_count,
            "send results"
        );

        SendDocumentResponse {
            success: request.recipients.is_empty()
                || sent_count.saturating_add(queued_count) > 0,
            results,
            queued_count,
            failed_count,
        }
    }

    /// Upload the document and send it to one validated recipient.
    async fn send_to_recipient(
        &self,
        request: &SendDocumentRequest,
        to: &str,
    ) -> Result<String, ChannelError> {
        let media_id = self
            .channel
            .upload_media(&request.document, &request.filename)
            .await?;
        let caption = caption_for(request);
        self.channel
            .send_document(to, &media_id, &request.filename, &caption)
            .await
    }

    /// Enqueue a retry job for one recipient with the fixed retry policy.
    async fn queue_retry(
        &self,
        request: &SendDocumentRequest,
        recipient: &Recipient,
    ) -> Result<String, QueueError> {
        let job = SendJob {
            tenant_id: request.tenant_id.clone(),
            recipient: recipient.clone(),
            document: base64::engine::general_purpose::STANDARD.encode(&request.document),
            filename: request.filename.clone(),
            custom_message: request.custom_message.clone(),
            metadata: request.metadata.clone(),
        };
        let data = serde_json::to_value(&job)?;
        self.queue
            .enqueue(
                SEND_QUEUE,
                data,
                EnqueueOptions {
                    delay_ms: Some(RETRY_DELAY_MS),
                    attempts: RETRY_ATTEMPTS,
                    priority: None,
                },
            )
            .await
    }
}

/// Caption for a send: the caller's custom message, or a default naming the
/// file.
pub fn caption_for(request: &SendDocumentRequest) -> String {
    request
        .custom_message
        .clone()
        .unwrap_or_else(|| format!("Document: {}", request.filename))
}
