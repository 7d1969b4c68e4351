use thiserror::Error;

use crate::retry::is_retryable_status;

/// Raw image bytes plus their content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlobError {
    #[error("blob request failed: {0}")]
    Request(String),

    #[error("blob request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("media lookup returned no download url")]
    MissingUrl,

    #[error("media download timed out")]
    Timeout,
}

impl BlobError {
    pub fn code(&self) -> &'static str {
        match self {
            BlobError::Timeout => "fetch_timeout",
            _ => "upload_failed",
        }
    }

    /// Network failures and transient statuses.
    pub fn is_retryable(&self) -> bool {
        match self {
            BlobError::Request(_) | BlobError::Timeout => true,
            BlobError::Rejected { status, .. } => is_retryable_status(*status),
            BlobError::MissingUrl => false,
        }
    }
}

impl From<reqwest::Error> for BlobError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            BlobError::Timeout
        } else {
            BlobError::Request(value.to_string())
        }
    }
}

/// Public image storage.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `blob` under `folder` and return its public URL.
    async fn upload(&self, folder: &str, blob: &MediaBlob) -> Result<String, BlobError>;

    /// Best effort; a missing object counts as deleted.
    async fn delete(&self, public_url: &str) -> Result<(), BlobError>;
}

/// Inbound media from the messaging provider.
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    async fn download(&self, media_id: &str) -> Result<MediaBlob, BlobError>;
}
