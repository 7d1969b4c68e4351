use thiserror::Error;

use crate::retry::is_retryable_status;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never got a response (connect, timeout, TLS).
    #[error("gateway request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("gateway rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected gateway response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        "gateway_failed"
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Request(_) => true,
            GatewayError::Rejected { status, .. } => is_retryable_status(*status),
            GatewayError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        GatewayError::Request(value.to_string())
    }
}

/// Provider verdict on whether a number is reachable on WhatsApp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactStatus {
    pub valid: bool,
    pub wa_id: Option<String>,
}

#[async_trait::async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), GatewayError>;

    /// Pre-approved template with positional body parameters.
    async fn send_template(&self, to: &str, template: &str, params: &[String]) -> Result<(), GatewayError>;

    async fn send_image(&self, to: &str, image_url: &str, caption: &str) -> Result<(), GatewayError>;

    async fn check_contact(&self, phone: &str) -> Result<ContactStatus, GatewayError>;
}
