use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::get,
};
use axum_extra::extract::cookie::Key;

use crate::config::Config;
use crate::db::{GalleryStorage, SqlitePool};
use crate::error::GalleryError;
use crate::handlers::{auth, browse, health, listings};
use crate::service::{Accounts, SchemaHandle, schema_actor};
use crate::storage::SharedStorage;

/// Request-independent context shared by every handler.
#[derive(Clone)]
pub struct GalleryState {
    pub storage: GalleryStorage,
    pub accounts: Accounts,
    pub schema: SchemaHandle,
    pub objects: SharedStorage,
    pub cookie_key: Key,
    pub secure_cookies: bool,
    pub allow_new_attributes: bool,
    pub max_upload_bytes: usize,
}

impl GalleryState {
    /// Wire up state over an already migrated pool.
    pub async fn new(
        cfg: &Config,
        pool: SqlitePool,
        objects: SharedStorage,
    ) -> Result<Self, GalleryError> {
        let storage = GalleryStorage::new(pool.clone());
        let schema = schema_actor::spawn(pool).await?;
        Ok(Self {
            accounts: Accounts::new(storage.clone()),
            storage,
            schema,
            objects,
            cookie_key: cfg.cookie_key()?,
            secure_cookies: !cfg.basic.insecure_cookie,
            allow_new_attributes: cfg.listings.allow_new_attributes,
            max_upload_bytes: cfg.storage.max_upload_bytes,
        })
    }
}

impl FromRef<GalleryState> for Key {
    fn from_ref(state: &GalleryState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn gallery_router(state: GalleryState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(auth::home))
        .route("/index", get(auth::home))
        .route("/visitor", get(auth::visitor))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", get(auth::logout))
        .route("/sections", get(browse::show_sections))
        .route("/categories/{section_id}", get(browse::show_categories))
        .route("/items/{category_id}", get(browse::show_items))
        .route("/item/{table}/{item_id}", get(browse::item_detail))
        .route(
            "/create",
            get(listings::create_form).post(listings::create_listing),
        )
        .route("/health", get(health::health))
        .route("/status", get(health::status))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
