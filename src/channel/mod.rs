//! Delivery channel abstraction: media upload + document message send.
//!
//! The orchestrator talks to WhatsApp through the [`DeliveryChannel`] trait so
//! tests can substitute a mock and the composition root can wire one client
//! per tenant (see [`registry::ChannelRegistry`]).

use async_trait::async_trait;

pub mod cloud_api;
pub mod registry;

/// Errors from a delivery channel implementation.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP transport failure (network, timeout, TLS).
    #[error("channel request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider responded with a non-success status.
    #[error("provider returned status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body, truncated.
        body: String,
    },

    /// Media upload succeeded at the HTTP level but no media id came back.
    #[error("no media id returned from upload")]
    MissingMediaId,

    /// Message send succeeded at the HTTP level but no message id came back.
    #[error("no message ID returned from WhatsApp API")]
    MissingMessageId,
}

/// Outbound document delivery operations.
///
/// Implementations must be `Send + Sync`; they are shared across in-flight
/// send requests behind an `Arc`.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Upload a document as provider media. Returns the provider media id.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] on transport failure, provider rejection, or
    /// a missing media id in the response.
    async fn upload_media(&self, file: &[u8], filename: &str) -> Result<String, ChannelError>;

    /// Send a document message referencing previously-uploaded media.
    ///
    /// `to` must be a canonical `+`-prefixed number. Returns the provider
    /// message id.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] on transport failure, provider rejection, or
    /// a missing message id in the response.
    async fn send_document(
        &self,
        to: &str,
        media_id: &str,
        filename: &str,
        caption: &str,
    ) -> Result<String, ChannelError>;
}
