use crate::db::GalleryStorage;
use crate::error::GalleryError;
use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const MAX_USERNAME_LEN: usize = 64;

/// The identity a session cookie carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

/// Signup and login over the `users` table.
#[derive(Clone)]
pub struct Accounts {
    storage: GalleryStorage,
}

impl Accounts {
    pub fn new(storage: GalleryStorage) -> Self {
        Self { storage }
    }

    /// Register a new user and return its id. A taken username leaves the
    /// table untouched.
    pub async fn signup(&self, username: &str, password: &str) -> Result<i64, GalleryError> {
        let username = username.trim();
        if username.is_empty() || username.len() > MAX_USERNAME_LEN {
            return Err(GalleryError::InvalidForm(format!(
                "username must be 1-{MAX_USERNAME_LEN} characters"
            )));
        }
        if password.is_empty() {
            return Err(GalleryError::InvalidForm("password must not be empty".to_string()));
        }

        if self.storage.find_user(username).await?.is_some() {
            return Err(GalleryError::DuplicateUsername);
        }

        let hash = hash_password(password.to_string()).await?;
        let id = match self.storage.insert_user(username, &hash).await {
            Ok(id) => id,
            // Lost a race with a concurrent signup for the same name.
            Err(e) if e.is_unique_violation() => return Err(GalleryError::DuplicateUsername),
            Err(e) => return Err(e),
        };
        info!(user_id = id, username = %username, "user signed up");
        Ok(id)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<SessionUser, GalleryError> {
        let username = username.trim();
        let Some(user) = self.storage.find_user(username).await? else {
            return Err(GalleryError::InvalidCredentials);
        };
        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            return Err(GalleryError::InvalidCredentials);
        }
        info!(user_id = user.id, username = %user.username, "user logged in");
        Ok(SessionUser {
            id: user.id,
            username: user.username,
        })
    }
}

async fn hash_password(password: String) -> Result<String, GalleryError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| GalleryError::PasswordHash(e.to_string()))
    })
    .await
    .map_err(|e| GalleryError::PasswordHash(format!("hashing task failed: {e}")))?
}

async fn verify_password(password: String, stored: String) -> Result<bool, GalleryError> {
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&stored).map_err(|e| GalleryError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| GalleryError::PasswordHash(format!("verify task failed: {e}")))?
}
