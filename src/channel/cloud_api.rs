//! WhatsApp Cloud API client.
//!
//! Implements [`DeliveryChannel`] against the Graph API: media is uploaded
//! with a multipart POST to `/{phone_number_id}/media`, then referenced by id
//! in a document message POST to `/{phone_number_id}/messages`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ChannelError, DeliveryChannel};

/// Default Graph API base URL.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// Default Graph API version.
pub const DEFAULT_API_VERSION: &str = "v18.0";

/// HTTP connect timeout for the reqwest client.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// HTTP request timeout for upload and send operations.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Error bodies are truncated to this many characters before logging.
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Credentials and endpoint settings for one tenant's Cloud API account.
#[derive(Debug, Clone)]
pub struct CloudApiConfig {
    /// Business phone number id the messages are sent from.
    pub phone_number_id: String,
    /// Bearer token for the Graph API.
    pub access_token: String,
    /// API version segment, e.g. `v18.0`.
    pub api_version: String,
    /// Base URL, normally [`DEFAULT_BASE_URL`].
    pub base_url: String,
}

/// Client for the WhatsApp Cloud (Graph) API.
pub struct CloudApiClient {
    client: reqwest::Client,
    config: CloudApiConfig,
}

/// Response from the media upload endpoint.
#[derive(Deserialize)]
struct MediaResponse {
    id: Option<String>,
}

/// Response from the message send endpoint.
#[derive(Deserialize)]
struct SendResponse {
    messages: Option<Vec<SentMessage>>,
}

/// A single message entry in a send response.
#[derive(Deserialize)]
struct SentMessage {
    id: String,
}

impl CloudApiClient {
    /// Create a client for one tenant's Cloud API account.
    pub fn new(config: CloudApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client with timeouts, using default");
                reqwest::Client::default()
            });
        Self { client, config }
    }

    fn endpoint(&self, operation: &str) -> String {
        format!(
            "{}/{}/{}/{operation}",
            self.config.base_url, self.config.api_version, self.config.phone_number_id
        )
    }

    /// Map a non-success response into [`ChannelError::Api`].
    async fn api_error(resp: reqwest::Response) -> ChannelError {
        let status = resp.status().as_u16();
        let body: String = resp
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect();
        ChannelError::Api { status, body }
    }
}

#[async_trait]
impl DeliveryChannel for CloudApiClient {
    async fn upload_media(&self, file: &[u8], filename: &str) -> Result<String, ChannelError> {
        let part = reqwest::multipart::Part::bytes(file.to_vec())
            .file_name(filename.to_owned())
            .mime_str(mime_type(filename))?;
        let form = reqwest::multipart::Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", media_type(filename).to_owned())
            .part("file", part);

        let resp = self
            .client
            .post(self.endpoint("media"))
            .bearer_auth(&self.config.access_token)
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }

        let body: MediaResponse = resp.json().await?;
        let media_id = body.id.ok_or(ChannelError::MissingMediaId)?;
        debug!(filename, media_id, "media uploaded");
        Ok(media_id)
    }

    async fn send_document(
        &self,
        to: &str,
        media_id: &str,
        filename: &str,
        caption: &str,
    ) -> Result<String, ChannelError> {
        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "document",
            "document": {
                "id": media_id,
                "filename": filename,
                "caption": caption,
            },
        });

        let resp = self
            .client
            .post(self.endpoint("messages"))
            .bearer_auth(&self.config.access_token)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }

        let body: SendResponse = resp.json().await?;
        let message_id = body
            .messages
            .and_then(|mut m| if m.is_empty() { None } else { Some(m.remove(0)) })
            .map(|m| m.id)
            .ok_or(ChannelError::MissingMessageId)?;
        debug!(to, message_id, "document message sent");
        Ok(message_id)
    }
}

/// MIME type inferred from the filename extension.
pub fn mime_type(filename: &str) -> &'static str {
    match extension(filename).as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Provider media category for a filename: `image` for pictures, otherwise
/// `document`.
pub fn media_type(filename: &str) -> &'static str {
    match extension(filename).as_str() {
        "jpg" | "jpeg" | "png" => "image",
        _ => "document",
    }
}

fn extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}
