use super::{ObjectStorage, public_url};
use crate::config::StorageConfig;
use crate::error::GalleryError;
use async_trait::async_trait;
use axum::body::Bytes;
use backon::{ExponentialBuilder, Retryable};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(200))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(3)
        .with_jitter()
}

/// Google Cloud Storage through its JSON API (simple media upload).
pub struct GcsStorage {
    client: reqwest::Client,
    endpoint: Url,
    bucket: String,
    access_token: Option<String>,
    retry_policy: ExponentialBuilder,
}

impl GcsStorage {
    pub fn new(cfg: &StorageConfig) -> Result<Self, GalleryError> {
        let client = reqwest::Client::builder()
            .user_agent("gallery-market/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
            bucket: cfg.bucket.clone(),
            access_token: cfg.access_token.clone().filter(|t| !t.is_empty()),
            retry_policy: default_retry_policy(),
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: ExponentialBuilder) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    fn upload_url(&self, object_name: &str) -> Result<Url, GalleryError> {
        let mut url = self.endpoint.join("upload/storage/v1/b/")?;
        url.path_segments_mut()
            .map_err(|_| GalleryError::Config("storage endpoint cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&self.bucket)
            .push("o");
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", object_name)
            .append_pair("predefinedAcl", "publicRead");
        Ok(url)
    }

    async fn try_upload(
        &self,
        url: Url,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), GalleryError> {
        let mut req = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = self.access_token.as_deref() {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GalleryError::UpstreamStatus(status));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for GcsStorage {
    async fn upload(
        &self,
        bytes: Bytes,
        object_name: &str,
        content_type: &str,
    ) -> Result<Url, GalleryError> {
        let url = self.upload_url(object_name)?;
        let size = bytes.len();

        (|| async {
            self.try_upload(url.clone(), bytes.clone(), content_type)
                .await
        })
        .retry(self.retry_policy.clone())
        .when(|e: &GalleryError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(
                "object upload retrying after error {}, sleeping {:?}",
                err, dur
            );
        })
        .await?;

        let public = public_url(&self.endpoint, &self.bucket, object_name)?;
        info!(bucket = %self.bucket, object = %object_name, size, "uploaded image");
        Ok(public)
    }
}
