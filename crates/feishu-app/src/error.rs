//! Error types for app identities

/// Errors from identity operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Refresh(#[from] token_refresh::Error),

    #[error(transparent)]
    Auth(#[from] feishu_auth::Error),
}

/// Result alias for identity operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Expose a refresher read failure through the provider traits.
pub(crate) fn unavailable(err: token_refresh::Error) -> feishu_auth::Error {
    feishu_auth::Error::Unavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_error_is_transparent() {
        let err: Error = token_refresh::Error::NoTokenYet("IA-cli_x-app".into()).into();
        assert_eq!(err.to_string(), "refresher IA-cli_x-app has no token yet");
    }

    #[test]
    fn unavailable_keeps_message() {
        let err = unavailable(token_refresh::Error::NoTokenYet("PA-cli_x-app".into()));
        assert!(matches!(err, feishu_auth::Error::Unavailable(ref m) if m.contains("PA-cli_x-app")));
    }
}
