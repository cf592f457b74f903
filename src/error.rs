//! Errors surfaced by the HTTP API

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::contact::{ContactError, MailError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No update carries the requested slug
    #[error("Post not found")]
    PostNotFound { slug: String },

    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error("Invalid request body")]
    InvalidBody,

    #[error(transparent)]
    Validation(#[from] ContactError),

    #[error("Failed to send message. Please try again.")]
    Mail(#[from] MailError),

    #[error("Failed to load content")]
    Load(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::PostNotFound { .. } => StatusCode::NOT_FOUND,
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Error::InvalidBody | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Mail(_) | Error::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Error::Mail(e) => tracing::error!("Contact delivery failed: {}", e),
            Error::Load(e) => tracing::error!("Content load task failed: {}", e),
            Error::PostNotFound { slug } => tracing::debug!("No update with slug {:?}", slug),
            _ => {}
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
