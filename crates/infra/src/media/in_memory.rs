use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use super::r#trait::{BlobError, BlobStore, MediaBlob, MediaSource};

const PUBLIC_BASE: &str = "memory://blobs";

/// Blob store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<String, MediaBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, public_url: &str) -> Option<MediaBlob> {
        self.objects.lock().ok()?.get(public_url).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> BlobError {
        BlobError::Request("lock poisoned".to_string())
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, folder: &str, blob: &MediaBlob) -> Result<String, BlobError> {
        let url = format!("{PUBLIC_BASE}/{folder}/{}", Uuid::now_v7());
        self.objects
            .lock()
            .map_err(|_| Self::poisoned())?
            .insert(url.clone(), blob.clone());
        Ok(url)
    }

    async fn delete(&self, public_url: &str) -> Result<(), BlobError> {
        self.objects
            .lock()
            .map_err(|_| Self::poisoned())?
            .remove(public_url);
        Ok(())
    }
}

/// Media source serving blobs registered up front; unknown ids are a 404.
#[derive(Debug, Default)]
pub struct InMemoryMediaSource {
    media: Mutex<HashMap<String, MediaBlob>>,
}

impl InMemoryMediaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, media_id: impl Into<String>, blob: MediaBlob) {
        if let Ok(mut media) = self.media.lock() {
            media.insert(media_id.into(), blob);
        }
    }
}

#[async_trait::async_trait]
impl MediaSource for InMemoryMediaSource {
    async fn download(&self, media_id: &str) -> Result<MediaBlob, BlobError> {
        self.media
            .lock()
            .map_err(|_| BlobError::Request("lock poisoned".to_string()))?
            .get(media_id)
            .cloned()
            .ok_or_else(|| BlobError::Rejected {
                status: 404,
                body: format!("unknown media {media_id}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> MediaBlob {
        MediaBlob {
            bytes: vec![0x89, b'P', b'N', b'G'],
            content_type: "image/png".to_string(),
        }
    }

    #[tokio::test]
    async fn upload_then_delete_twice() {
        let store = InMemoryBlobStore::new();
        let url = store.upload("manual-1", &png()).await.unwrap();
        assert_eq!(store.get(&url), Some(png()));

        store.delete(&url).await.unwrap();
        store.delete(&url).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unknown_media_is_not_found() {
        let source = InMemoryMediaSource::new();
        match source.download("nope").await {
            Err(BlobError::Rejected { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected 404, got {other:?}"),
        }
    }
}
