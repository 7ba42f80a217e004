//! Error types for the service history viewer

/// Errors that can occur while fetching, rendering or serving a history
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid service history: {0}")]
    InvalidDocument(String),

    #[error("Page task has stopped")]
    PageClosed,
}

/// Result type alias for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;
