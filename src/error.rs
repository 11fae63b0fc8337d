use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::engagement::EngagementError;

/// Every way a song request can fail, as seen by the caller
#[derive(Error, Debug)]
pub enum SongError {
    /// Catalog unreachable, rejected the request, or sent something unreadable
    #[error("External lookup failed: {0}")]
    ExternalLookupFailed(String),

    /// The catalog answered, but has no such song or artist
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Song {song_id} is already liked")]
    AlreadyLiked { song_id: String },

    /// Missing or unverifiable credential on an endpoint that requires one
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] EngagementError),
}

impl SongError {
    /// Stable machine-readable name of the failure
    pub fn kind(&self) -> &'static str {
        match self {
            SongError::ExternalLookupFailed(_) => "external_lookup_failed",
            SongError::NotFound(_) => "not_found",
            SongError::AlreadyLiked { .. } => "already_liked",
            SongError::InvalidCredential(_) => "invalid_credential",
            SongError::InvalidInput(_) => "invalid_input",
            SongError::Storage(_) => "storage",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SongError::ExternalLookupFailed(_) => StatusCode::BAD_GATEWAY,
            SongError::NotFound(_) => StatusCode::NOT_FOUND,
            SongError::AlreadyLiked { .. } => StatusCode::CONFLICT,
            SongError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            SongError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SongError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SongError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", self.kind(), self);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.kind(), self);
        }

        let body = json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for SongError {
    fn from(rejection: JsonRejection) -> Self {
        SongError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for SongError {
    fn from(rejection: QueryRejection) -> Self {
        SongError::InvalidInput(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, SongError>;
