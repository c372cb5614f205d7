use thiserror::Error;

pub type Result<T> = std::result::Result<T, PomcrawlError>;

#[derive(Debug, Error)]
pub enum PomcrawlError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("driver failure: {0}")]
    Driver(String),
    #[error("storage error during {operation}: {message}")]
    Storage { operation: String, message: String },
    #[error("{0}")]
    Other(String),
}

impl PomcrawlError {
    pub fn storage_error(operation: impl Into<String>, message: impl Into<String>) -> Self {
        PomcrawlError::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/* Conversions so `?` works smoothly */
impl From<std::io::Error> for PomcrawlError {
    fn from(e: std::io::Error) -> Self {
        PomcrawlError::Other(e.to_string())
    }
}
impl From<serde_json::Error> for PomcrawlError {
    fn from(e: serde_json::Error) -> Self {
        PomcrawlError::Other(e.to_string())
    }
}
impl From<reqwest::Error> for PomcrawlError {
    fn from(e: reqwest::Error) -> Self {
        PomcrawlError::Driver(e.to_string())
    }
}
