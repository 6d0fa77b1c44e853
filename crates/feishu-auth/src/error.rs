//! Error types for Feishu authorization calls

/// Errors from authorization calls and token providers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Feishu API error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
