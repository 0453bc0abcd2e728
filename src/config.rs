//! Runtime configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables `GALLERY_*` (`__` separates sections, e.g.
//!    `GALLERY_STORAGE__BUCKET`)
//! 2. `config.toml` in the working directory
//! 3. Built-in defaults

use crate::error::GalleryError;
use axum_extra::extract::cookie::Key;
use base64::Engine;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;
use url::Url;

pub const CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "GALLERY_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub basic: BasicConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub listings: ListingsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub loglevel: String,
    /// Base64 of at least 64 random bytes. Empty means a fresh key per process.
    pub session_secret: String,
    pub insecure_cookie: bool,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            session_secret: String::new(),
            insecure_cookie: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:gallery.db".to_string(),
            max_connections: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Gcs,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    pub endpoint: Url,
    pub access_token: Option<String>,
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Gcs,
            bucket: "gallery-images".to_string(),
            endpoint: Url::parse(crate::storage::GCS_ENDPOINT)
                .expect("static storage endpoint is a valid URL"),
            access_token: None,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingsConfig {
    /// Let the request path add columns for attributes outside the known set.
    pub allow_new_attributes: bool,
}

impl Config {
    pub fn load() -> Result<Self, GalleryError> {
        Self::figment(Path::new(CONFIG_FILE))
            .extract()
            .map_err(GalleryError::from)
    }

    pub fn figment(config_file: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if config_file.exists() {
            figment = figment.merge(Toml::file(config_file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Cookie encryption key derived from `basic.session_secret`.
    pub fn cookie_key(&self) -> Result<Key, GalleryError> {
        let secret = self.basic.session_secret.trim();
        if secret.is_empty() {
            warn!("session_secret not set; sessions will not survive a restart");
            return Ok(Key::generate());
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(secret)
            .map_err(|e| GalleryError::Config(format!("session_secret is not base64: {e}")))?;
        Key::try_from(bytes.as_slice()).map_err(|_| {
            GalleryError::Config("session_secret must decode to at least 64 bytes".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict_and_target_gcs() {
        let cfg = Config::default();
        assert_eq!(cfg.storage.backend, StorageBackend::Gcs);
        assert_eq!(cfg.storage.endpoint.as_str(), "https://storage.googleapis.com/");
        assert!(!cfg.listings.allow_new_attributes);
        assert!(!cfg.basic.insecure_cookie);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [storage]
            backend = "memory"
            bucket = "listing-photos"

            [listings]
            allow_new_attributes = true
            "#,
        )
        .unwrap();

        let cfg: Config = Config::figment(&path).extract().unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.storage.bucket, "listing-photos");
        assert!(cfg.listings.allow_new_attributes);
        assert_eq!(cfg.database.url, "sqlite:gallery.db");
    }

    #[test]
    fn short_session_secret_is_rejected() {
        let mut cfg = Config::default();
        cfg.basic.session_secret = base64::engine::general_purpose::STANDARD.encode([7u8; 16]);
        assert!(matches!(cfg.cookie_key(), Err(GalleryError::Config(_))));

        cfg.basic.session_secret = base64::engine::general_purpose::STANDARD.encode([7u8; 64]);
        assert!(cfg.cookie_key().is_ok());
    }
}
