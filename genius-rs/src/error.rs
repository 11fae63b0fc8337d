use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeniusError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GeniusError {
    /// Whether the catalog answered but had nothing for the request
    pub fn is_not_found(&self) -> bool {
        matches!(self, GeniusError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, GeniusError>;
