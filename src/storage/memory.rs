use super::{ObjectStorage, public_url};
use crate::error::GalleryError;
use async_trait::async_trait;
use axum::body::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Process-local bucket. URLs have the same shape as the real backend's
/// but nothing serves them.
pub struct MemoryStorage {
    bucket: String,
    endpoint: Url,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryStorage {
    pub fn new(bucket: &str, endpoint: Url) -> Self {
        Self {
            bucket: bucket.to_string(),
            endpoint,
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, object_name: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(object_name).cloned())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        bytes: Bytes,
        object_name: &str,
        content_type: &str,
    ) -> Result<Url, GalleryError> {
        let url = public_url(&self.endpoint, &self.bucket, object_name)?;
        let mut objects = self
            .objects
            .write()
            .map_err(|_| GalleryError::Config("memory storage lock poisoned".to_string()))?;
        debug!(object = %object_name, size = bytes.len(), "stored object in memory");
        objects.insert(
            object_name.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::GCS_ENDPOINT;

    #[tokio::test]
    async fn keeps_bytes_and_returns_endpoint_url() {
        let storage = MemoryStorage::new("gallery-images", Url::parse(GCS_ENDPOINT).unwrap());
        let url = storage
            .upload(Bytes::from_static(b"GIF89a"), "x_cat.gif", "image/gif")
            .await
            .unwrap();

        assert!(url.as_str().starts_with(GCS_ENDPOINT));
        assert!(url.as_str().ends_with("/gallery-images/x_cat.gif"));
        let stored = storage.get("x_cat.gif").unwrap();
        assert_eq!(stored.bytes, Bytes::from_static(b"GIF89a"));
        assert_eq!(stored.content_type, "image/gif");
        assert_eq!(storage.len(), 1);
    }
}
