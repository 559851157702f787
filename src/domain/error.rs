use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Reasons a payload cannot be treated as a GeoJSON document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid JSON data. The file is not valid GeoJSON.")]
    InvalidJson(#[source] serde_json::Error),
    #[error("GeoJSON document must be a JSON object.")]
    NotAnObject,
    #[error("GeoJSON document is empty.")]
    Empty,
}
