use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unsupported platform: {platform}. Use one of: {supported}")]
    UnsupportedPlatform { platform: String, supported: String },

    #[error("Rate limit exceeded after repeated 429 responses")]
    RateLimitExceeded,

    #[error("Unauthorized (401/403): {0}")]
    Unauthorized(String),

    #[error("Resource not found (404)")]
    NotFound,

    #[error("Riot API error: {status} - {body}")]
    UpstreamError { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    UnexpectedResponseShape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON parsing error: {0}")]
    Json(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
