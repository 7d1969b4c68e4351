use std::collections::HashMap;
use std::sync::Mutex;

use super::r#trait::{FetchError, LinkFetcher};

/// Serves canned pages; unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct InMemoryLinkFetcher {
    pages: Mutex<HashMap<String, String>>,
}

impl InMemoryLinkFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, html: impl Into<String>) {
        if let Ok(mut pages) = self.pages.lock() {
            pages.insert(url.into(), html.into());
        }
    }
}

#[async_trait::async_trait]
impl LinkFetcher for InMemoryLinkFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let pages = self
            .pages
            .lock()
            .map_err(|_| FetchError::Request("lock poisoned".to_string()))?;
        pages.get(url).cloned().ok_or(FetchError::Rejected(404))
    }
}
