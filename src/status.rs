//! Delivery status tracking.
//!
//! Read-only projection over persisted message records. The lookup never
//! surfaces an error to the caller: an unknown id is `pending` (the message
//! may still be in flight), and a store fault degrades to `failed` with the
//! underlying message attached.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::warn;

/// Lifecycle state of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Not yet resolved — in flight or unknown id.
    Pending,
    /// Accepted by the provider.
    Sent,
    /// Delivered to the recipient's device.
    Delivered,
    /// Read by the recipient.
    Read,
    /// Delivery failed.
    Failed,
}

impl MessageStatus {
    /// Map a persisted status string; anything unrecognized is `pending`.
    fn from_db(s: &str) -> Self {
        match s {
            "sent" => Self::Sent,
            "delivered" => Self::Delivered,
            "read" => Self::Read,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// What happened to one outbound message.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryStatus {
    /// The provider message id that was queried.
    pub message_id: String,
    /// Current lifecycle state.
    pub status: MessageStatus,
    /// RFC 3339 timestamp of provider acceptance, if reached.
    pub sent_at: Option<String>,
    /// RFC 3339 timestamp of device delivery, if reached.
    pub delivered_at: Option<String>,
    /// RFC 3339 timestamp of the read receipt, if reached.
    pub read_at: Option<String>,
    /// Error text for failed deliveries or degraded lookups.
    pub error: Option<String>,
}

impl DeliveryStatus {
    fn pending(message_id: &str) -> Self {
        Self {
            message_id: message_id.to_owned(),
            status: MessageStatus::Pending,
            sent_at: None,
            delivered_at: None,
            read_at: None,
            error: None,
        }
    }

    /// The most advanced lifecycle timestamp available:
    /// read, else delivered, else sent.
    pub fn timestamp(&self) -> Option<&str> {
        self.read_at
            .as_deref()
            .or(self.delivered_at.as_deref())
            .or(self.sent_at.as_deref())
    }
}

/// Look up what happened to a message.
///
/// Never returns an error: unknown ids resolve to `pending` and store
/// failures to `failed` with the error text attached.
pub async fn delivery_status(db: &SqlitePool, message_id: &str) -> DeliveryStatus {
    type StatusRow = (String, Option<String>, Option<String>, Option<String>, Option<String>);
    let result: Result<Option<StatusRow>, sqlx::Error> = sqlx::query_as(
        "SELECT status, sent_at, delivered_at, read_at, error_message \
         FROM whatsapp_messages WHERE message_id = ?1",
    )
    .bind(message_id)
    .fetch_optional(db)
    .await;

    match result {
        Ok(Some((status, sent_at, delivered_at, read_at, error))) => DeliveryStatus {
            message_id: message_id.to_owned(),
            status: MessageStatus::from_db(&status),
            sent_at,
            delivered_at,
            read_at,
            error,
        },
        Ok(None) => DeliveryStatus::pending(message_id),
        Err(e) => {
            warn!(message_id, error = %e, "delivery status lookup failed");
            DeliveryStatus {
                message_id: message_id.to_owned(),
                status: MessageStatus::Failed,
                sent_at: None,
                delivered_at: None,
                read_at: None,
                error: Some(e.to_string()),
            }
        }
    }
}
