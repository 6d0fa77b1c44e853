//! Error types for webhook handling

/// Errors from decoding a webhook request.
///
/// `status_code()` gives the HTTP status Feishu expects for each rejection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to decrypt payload: {0}")]
    Decrypt(String),

    #[error("received an encrypted payload but no encrypt key is configured")]
    NoDecrypter,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("verification token mismatch")]
    VerificationFailed,

    #[error("no app ticket received yet")]
    NoTicketYet,

    #[error("invalid webhook configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Decrypt(_) | Error::NoDecrypter => 461,
            Error::MalformedPayload(_) => 462,
            Error::VerificationFailed => 463,
            Error::NoTicketYet | Error::InvalidConfig(_) => 500,
        }
    }
}

/// Result alias for webhook operations.
pub type Result<T> = std::result::Result<T, Error>;
