use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::middleware::session::{
    self, FlashLevel, FlashMessage, end_session, push_flash, start_session, take_flashes,
};
use crate::{GalleryError, router::GalleryState};

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct FormPage {
    pub form: &'static str,
    pub flashes: Vec<FlashMessage>,
}

/// GET / and /index -> sections for a logged-in user, login page otherwise.
pub async fn home(jar: PrivateCookieJar) -> Redirect {
    if session::session_user(&jar).is_some() {
        Redirect::to("/sections")
    } else {
        Redirect::to(session::LOGIN_PATH)
    }
}

/// GET /visitor -> browse without an account.
pub async fn visitor() -> Redirect {
    Redirect::to("/sections")
}

pub async fn login_page(jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = take_flashes(jar);
    (jar, Json(FormPage { form: "login", flashes }))
}

pub async fn signup_page(jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = take_flashes(jar);
    (jar, Json(FormPage { form: "signup", flashes }))
}

/// POST /login -> session cookie on success, flash + back to the form otherwise.
pub async fn login(
    State(state): State<GalleryState>,
    jar: PrivateCookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, GalleryError> {
    match state.accounts.login(&form.username, &form.password).await {
        Ok(user) => {
            let jar = start_session(jar, &user, state.secure_cookies)?;
            Ok((jar, Redirect::to("/index")).into_response())
        }
        Err(GalleryError::InvalidCredentials) => {
            info!(username = %form.username.trim(), "login rejected");
            let jar = push_flash(
                jar,
                FlashLevel::Error,
                "Invalid credentials",
                state.secure_cookies,
            );
            Ok((jar, Redirect::to(session::LOGIN_PATH)).into_response())
        }
        Err(e) => Err(e),
    }
}

/// POST /signup -> back to login on success, back to the form on a taken name.
pub async fn signup(
    State(state): State<GalleryState>,
    jar: PrivateCookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, GalleryError> {
    let secure = state.secure_cookies;
    match state.accounts.signup(&form.username, &form.password).await {
        Ok(_) => {
            let jar = push_flash(
                jar,
                FlashLevel::Success,
                "Signup successful! Please log in.",
                secure,
            );
            Ok((jar, Redirect::to(session::LOGIN_PATH)).into_response())
        }
        Err(e @ (GalleryError::DuplicateUsername | GalleryError::InvalidForm(_))) => {
            let message = match e {
                GalleryError::InvalidForm(reason) => reason,
                other => other.to_string(),
            };
            let jar = push_flash(jar, FlashLevel::Error, message, secure);
            Ok((jar, Redirect::to("/signup")).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn logout(State(state): State<GalleryState>, jar: PrivateCookieJar) -> impl IntoResponse {
    let jar = end_session(jar);
    let jar = push_flash(
        jar,
        FlashLevel::Info,
        "You have been logged out.",
        state.secure_cookies,
    );
    (jar, Redirect::to(session::LOGIN_PATH))
}
