use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use super::r#trait::{BlobError, MediaBlob, MediaSource};

#[derive(Debug, Deserialize)]
struct MediaLookup {
    url: Option<String>,
    mime_type: Option<String>,
}

/// Two-step Cloud API media download: `GET {base}/{media_id}` for a
/// short-lived URL, then `GET` that URL with the same bearer token.
#[derive(Clone)]
pub struct WhatsAppMediaSource {
    client: Client,
    api_base: String,
    access_token: String,
    timeout: Duration,
}

impl WhatsAppMediaSource {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            access_token: access_token.into(),
            timeout,
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, BlobError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BlobError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl MediaSource for WhatsAppMediaSource {
    #[instrument(skip(self), err)]
    async fn download(&self, media_id: &str) -> Result<MediaBlob, BlobError> {
        let lookup: MediaLookup = self
            .get(&format!("{}/{media_id}", self.api_base))
            .await?
            .json()
            .await?;
        let url = lookup.url.filter(|u| !u.is_empty()).ok_or(BlobError::MissingUrl)?;

        let response = self.get(&url).await?;
        let content_type = lookup
            .mime_type
            .or_else(|| {
                response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = response.bytes().await?;

        Ok(MediaBlob {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
