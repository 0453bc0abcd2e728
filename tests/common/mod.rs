#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use gallery_market::{
    Config, GalleryState,
    config::DatabaseConfig,
    db::{self, SqlitePool},
    gallery_router,
    storage::{GCS_ENDPOINT, MemoryStorage, SharedStorage},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

pub const BOUNDARY: &str = "gallery-test-boundary";

/// A router over a fresh database and an in-memory bucket, with a cookie
/// store that behaves like a browser across requests.
pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub objects: Arc<MemoryStorage>,
    cookies: HashMap<String, String>,
    _dir: TempDir,
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(tweak: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut cfg = Config::default();
        cfg.basic.insecure_cookie = true;
        cfg.database = DatabaseConfig {
            url: format!("sqlite:{}", dir.path().join("gallery.db").display()),
            max_connections: 4,
        };
        tweak(&mut cfg);

        let pool = db::connect(&cfg.database).await.expect("open sqlite pool");
        db::migrate::run(&pool).await.expect("run migrations");

        let endpoint = Url::parse(GCS_ENDPOINT).expect("endpoint url");
        let objects = Arc::new(MemoryStorage::new(&cfg.storage.bucket, endpoint));
        let shared: SharedStorage = objects.clone();

        let state = GalleryState::new(&cfg, pool.clone(), shared)
            .await
            .expect("build state");
        Self {
            app: gallery_router(state),
            pool,
            objects,
            cookies: HashMap::new(),
            _dir: dir,
        }
    }

    pub async fn send(&mut self, mut req: Request<Body>) -> Response<Body> {
        if !self.cookies.is_empty() {
            let header_value = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            req.headers_mut()
                .insert(header::COOKIE, header_value.parse().expect("cookie header"));
        }

        let resp = self.app.clone().oneshot(req).await.expect("router response");

        for set_cookie in resp.headers().get_all(header::SET_COOKIE) {
            let raw = set_cookie.to_str().expect("ascii set-cookie");
            let pair = raw.split(';').next().unwrap_or_default();
            let (name, value) = pair.split_once('=').expect("cookie pair");
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
        resp
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        let req = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("build request");
        self.send(req).await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> Response<Body> {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .expect("build request");
        self.send(req).await
    }

    pub async fn post_multipart(&mut self, uri: &str, parts: &[Part<'_>]) -> Response<Body> {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .expect("build request");
        self.send(req).await
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub async fn signup_and_login(&mut self, username: &str, password: &str) {
        let form = format!("username={username}&password={password}");
        let resp = self.post_form("/signup", &form).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        // Follow the redirect to the login page, which shows the signup notice.
        assert_eq!(
            self.flashes().await,
            vec!["Signup successful! Please log in.".to_string()]
        );
        let resp = self.post_form("/login", &form).await;
        assert_eq!(location(&resp), "/index");
    }

    /// The flash messages currently queued, drained via the login page.
    pub async fn flashes(&mut self) -> Vec<String> {
        let resp = self.get("/login").await;
        let body = json_body(resp).await;
        body["flashes"]
            .as_array()
            .map(|flashes| {
                flashes
                    .iter()
                    .filter_map(|f| f["message"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM \"{table}\""))
            .fetch_one(&self.pool)
            .await
            .expect("count rows")
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn json_body(resp: Response<Body>) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn text_body(resp: Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
