use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::r#trait::{BlobError, BlobStore, MediaBlob};
use crate::retry::{RetryPolicy, retry_with};

const BUCKET: &str = "products";
const PREFIX: &str = "product-images";

/// Supabase Storage over its REST API.
///
/// Objects land at `products/product-images/{folder}/{uuid}.{ext}`; uploads
/// are retried per the upload policy since each one writes a fresh key.
#[derive(Clone)]
pub struct SupabaseBlobStore {
    client: Client,
    base_url: String,
    service_role_key: String,
    retry: RetryPolicy,
}

impl SupabaseBlobStore {
    pub fn new(client: Client, base_url: impl Into<String>, service_role_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_role_key: service_role_key.into(),
            retry: RetryPolicy::uploads(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{BUCKET}/{path}", self.base_url)
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{BUCKET}/{path}", self.base_url)
    }

    /// Object path for a public URL issued by this store.
    fn path_of(&self, public_url: &str) -> Option<String> {
        let prefix = self.public_url("");
        public_url.strip_prefix(&prefix).map(str::to_string)
    }

    async fn put(&self, path: &str, blob: &MediaBlob) -> Result<(), BlobError> {
        let response = self
            .client
            .post(self.object_url(path))
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .header("content-type", &blob.content_type)
            .body(blob.bytes.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlobError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

pub(crate) fn extension_for(content_type: &str) -> &'static str {
    match content_type.split(';').next().map(str::trim) {
        Some("image/webp") => "webp",
        Some("image/png") => "png",
        Some("image/jpeg") | Some("image/jpg") => "jpg",
        Some("image/gif") => "gif",
        _ => "bin",
    }
}

#[async_trait::async_trait]
impl BlobStore for SupabaseBlobStore {
    #[instrument(skip(self, blob), fields(bytes = blob.bytes.len()), err)]
    async fn upload(&self, folder: &str, blob: &MediaBlob) -> Result<String, BlobError> {
        let path = format!(
            "{PREFIX}/{folder}/{}.{}",
            Uuid::now_v7(),
            extension_for(&blob.content_type)
        );

        retry_with(&self.retry, BlobError::is_retryable, || self.put(&path, blob)).await?;

        debug!(%path, "image stored");
        Ok(self.public_url(&path))
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, public_url: &str) -> Result<(), BlobError> {
        let Some(path) = self.path_of(public_url) else {
            debug!("not one of our objects; nothing to delete");
            return Ok(());
        };

        let response = self
            .client
            .delete(self.object_url(&path))
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() || s == StatusCode::NOT_FOUND => Ok(()),
            s => Err(BlobError::Rejected {
                status: s.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}
