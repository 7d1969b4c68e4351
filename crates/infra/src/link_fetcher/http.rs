use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};

use super::r#trait::{FetchError, LinkFetcher};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; StorefrontBot/1.0)";

/// Bytes of a page kept for metadata extraction; the rest is never read.
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

/// Page fetcher over reqwest, bounded by a per-request timeout and
/// [`MAX_PAGE_BYTES`].
#[derive(Clone)]
pub struct HttpLinkFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpLinkFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait::async_trait]
impl LinkFetcher for HttpLinkFetcher {
    #[instrument(skip(self), err)]
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let mut response = self
            .client
            .get(parsed)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Rejected(status.as_u16()));
        }

        let mut body = Vec::with_capacity(
            response
                .content_length()
                .map_or(0, |len| (len as usize).min(MAX_PAGE_BYTES)),
        );
        while let Some(chunk) = response.chunk().await? {
            if !append_capped(&mut body, &chunk, MAX_PAGE_BYTES) {
                debug!(%url, limit = MAX_PAGE_BYTES, "page truncated");
                break;
            }
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Append up to `limit` bytes in total; `false` once the limit is reached.
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(body.len());
    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
    body.len() < limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_stops_growing_at_the_limit() {
        let mut body = Vec::new();
        assert!(append_capped(&mut body, b"<html>", 10));
        assert!(!append_capped(&mut body, b"<head>..", 10));
        assert_eq!(body, b"<html><hea");
        assert!(!append_capped(&mut body, b"more", 10));
        assert_eq!(body.len(), 10);
    }

    #[tokio::test]
    async fn non_http_schemes_are_rejected_before_any_request() {
        let fetcher = HttpLinkFetcher::new(Client::new(), Duration::from_secs(1));
        match fetcher.fetch_html("ftp://example.com/item").await {
            Err(FetchError::InvalidUrl(_)) => {}
            other => panic!("expected InvalidUrl, got {other:?}"),
        }
        match fetcher.fetch_html("not a url").await {
            Err(e) => assert_eq!(e.code(), "invalid_url"),
            Ok(_) => panic!("expected InvalidUrl"),
        }
    }
}
