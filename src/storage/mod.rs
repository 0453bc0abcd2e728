//! Object storage gateway for listing images.

pub mod filename;
pub mod gcs;
pub mod memory;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::GalleryError;
use async_trait::async_trait;
use axum::body::Bytes;
use std::sync::Arc;
use url::Url;

pub use filename::{allowed_file, content_type_for, object_name, secure_filename};
pub use gcs::GcsStorage;
pub use memory::MemoryStorage;

pub const GCS_ENDPOINT: &str = "https://storage.googleapis.com/";

/// Uploads an object and hands back the URL browsers fetch it from.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bytes: Bytes,
        object_name: &str,
        content_type: &str,
    ) -> Result<Url, GalleryError>;
}

pub type SharedStorage = Arc<dyn ObjectStorage>;

pub fn from_config(cfg: &StorageConfig) -> Result<SharedStorage, GalleryError> {
    let storage: SharedStorage = match cfg.backend {
        StorageBackend::Gcs => Arc::new(GcsStorage::new(cfg)?),
        StorageBackend::Memory => Arc::new(MemoryStorage::new(&cfg.bucket, cfg.endpoint.clone())),
    };
    Ok(storage)
}

/// `{endpoint}{bucket}/{object}` with the object name as a single path segment.
pub fn public_url(endpoint: &Url, bucket: &str, object_name: &str) -> Result<Url, GalleryError> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| GalleryError::Config(format!("storage endpoint {endpoint} cannot be a base")))?
        .pop_if_empty()
        .push(bucket)
        .push(object_name);
    Ok(url)
}

/// Rewrite `gs://bucket/object` references to their public HTTPS form.
/// Anything else is returned unchanged.
pub fn gs_to_public(url: &str) -> String {
    match url.strip_prefix("gs://") {
        Some(rest) => format!("{GCS_ENDPOINT}{rest}"),
        None => url.to_string(),
    }
}
