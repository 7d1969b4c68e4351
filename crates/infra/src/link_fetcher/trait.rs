use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("not an http(s) url: {0}")]
    InvalidUrl(String),

    #[error("page request failed: {0}")]
    Request(String),

    #[error("page responded with status {0}")]
    Rejected(u16),

    #[error("page request timed out")]
    Timeout,
}

impl FetchError {
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl(_) => "invalid_url",
            _ => "scrape_failed",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Request(value.to_string())
        }
    }
}

#[async_trait::async_trait]
pub trait LinkFetcher: Send + Sync {
    /// HTML body of `url`. Non-success statuses are errors.
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}
