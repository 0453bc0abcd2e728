use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::debug;

use crate::error::GalleryError;
use crate::service::accounts::SessionUser;

pub const SESSION_COOKIE: &str = "gallery_session";
pub const FLASH_COOKIE: &str = "gallery_flash";
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

/// One-shot user notice carried across a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

/// The logged-in user. Rejects with a redirect to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(jar) = PrivateCookieJar::<Key>::from_request_parts(parts, state).await;
        match session_user(&jar) {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                debug!(path = %parts.uri.path(), "no session; redirecting to login");
                Err(Redirect::to(LOGIN_PATH).into_response())
            }
        }
    }
}

pub fn session_user(jar: &PrivateCookieJar) -> Option<SessionUser> {
    let cookie = jar.get(SESSION_COOKIE)?;
    serde_json::from_str(cookie.value()).ok()
}

pub fn start_session(
    jar: PrivateCookieJar,
    user: &SessionUser,
    secure: bool,
) -> Result<PrivateCookieJar, GalleryError> {
    let value = serde_json::to_string(user)?;
    Ok(jar.add(build_cookie(SESSION_COOKIE, value, secure, None)))
}

pub fn end_session(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(clear_cookie(SESSION_COOKIE))
}

/// Queue a flash message, keeping any not yet shown.
pub fn push_flash(
    jar: PrivateCookieJar,
    level: FlashLevel,
    message: impl Into<String>,
    secure: bool,
) -> PrivateCookieJar {
    let mut pending = read_flashes(&jar);
    pending.push(FlashMessage {
        level,
        message: message.into(),
    });
    match serde_json::to_string(&pending) {
        Ok(value) => jar.add(build_cookie(
            FLASH_COOKIE,
            value,
            secure,
            Some(Duration::minutes(5)),
        )),
        Err(_) => jar,
    }
}

/// Drain pending flash messages.
pub fn take_flashes(jar: PrivateCookieJar) -> (PrivateCookieJar, Vec<FlashMessage>) {
    let pending = read_flashes(&jar);
    if pending.is_empty() {
        return (jar, pending);
    }
    (jar.remove(clear_cookie(FLASH_COOKIE)), pending)
}

fn read_flashes(jar: &PrivateCookieJar) -> Vec<FlashMessage> {
    jar.get(FLASH_COOKIE)
        .and_then(|c| serde_json::from_str(c.value()).ok())
        .unwrap_or_default()
}

fn build_cookie(
    name: &str,
    value: String,
    secure: bool,
    max_age: Option<Duration>,
) -> Cookie<'static> {
    let mut builder = Cookie::build(Cookie::new(name.to_string(), value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);
    if let Some(age) = max_age {
        builder = builder.max_age(age);
    }
    builder.build()
}

fn clear_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
