//! Append-only audit of product ingestion tries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use storefront_catalog::SourceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Success,
    Error,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionAttempt {
    pub sender: String,
    pub source_type: SourceType,
    /// The URL for links, the product name for chat-built products.
    pub source_value: String,
    pub status: AttemptStatus,
    pub error_code: Option<String>,
    /// Snapshot of the created product, `{}` for failures.
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl IngestionAttempt {
    pub fn success(
        sender: impl Into<String>,
        source_type: SourceType,
        source_value: impl Into<String>,
        payload: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sender: sender.into(),
            source_type,
            source_value: source_value.into(),
            status: AttemptStatus::Success,
            error_code: None,
            payload,
            created_at: now,
        }
    }

    pub fn failure(
        sender: impl Into<String>,
        source_type: SourceType,
        source_value: impl Into<String>,
        error_code: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sender: sender.into(),
            source_type,
            source_value: source_value.into(),
            status: AttemptStatus::Error,
            error_code: Some(error_code.to_string()),
            payload: Value::Object(Default::default()),
            created_at: now,
        }
    }
}
