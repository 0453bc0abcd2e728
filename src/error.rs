use axum::extract::multipart::MultipartError;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum GalleryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Object storage responded with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Invalid form: {0}")]
    InvalidForm(String),

    #[error("Unknown category id {0}")]
    CategoryNotFound(i64),

    #[error("Unknown listing table `{0}`")]
    TableNotFound(String),

    #[error("Listing {id} not found in `{table}`")]
    ListingNotFound { table: String, id: i64 },

    #[error("Invalid attribute name: {0}")]
    InvalidIdentifier(String),

    #[error("Unknown attribute: {attribute}")]
    UnknownAttribute { table: String, attribute: String },

    #[error("No attributes provided.")]
    NoAttributes,

    #[error("File type not allowed: {0}")]
    DisallowedFileType(String),

    #[error("Username already taken!")]
    DuplicateUsername,

    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl GalleryError {
    /// Whether an object storage call is worth repeating.
    pub fn is_retryable(&self) -> bool {
        match self {
            GalleryError::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            GalleryError::UpstreamStatus(code) => {
                code.is_server_error() || *code == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// SQLite reports a concurrent `ADD COLUMN` of the same name this way.
    pub fn is_duplicate_column(&self) -> bool {
        match self {
            GalleryError::DatabaseError(SqlxError::Database(db)) => {
                db.message().contains("duplicate column name")
            }
            _ => false,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            GalleryError::DatabaseError(SqlxError::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<figment::Error> for GalleryError {
    fn from(e: figment::Error) -> Self {
        GalleryError::Config(e.to_string())
    }
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            GalleryError::CategoryNotFound(_)
            | GalleryError::TableNotFound(_)
            | GalleryError::ListingNotFound { .. } => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string())
            }
            GalleryError::InvalidIdentifier(_)
            | GalleryError::UnknownAttribute { .. }
            | GalleryError::NoAttributes
            | GalleryError::DisallowedFileType(_)
            | GalleryError::InvalidForm(_) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", self.to_string())
            }
            GalleryError::Multipart(e) => (e.status(), "BAD_REQUEST", e.body_text()),
            GalleryError::DuplicateUsername => {
                (StatusCode::CONFLICT, "CONFLICT", self.to_string())
            }
            GalleryError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
            }
            GalleryError::Reqwest(_) | GalleryError::UpstreamStatus(_) => (
                StatusCode::BAD_GATEWAY,
                "BAD_GATEWAY",
                "Object storage is unavailable.".to_string(),
            ),
            GalleryError::Config(_)
            | GalleryError::UrlParse(_)
            | GalleryError::Json(_)
            | GalleryError::DatabaseError(_)
            | GalleryError::RactorError(_)
            | GalleryError::PasswordHash(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
