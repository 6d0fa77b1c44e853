//! Error types for token refresh

/// Boxed error returned by token sources and update callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from refresher operations.
///
/// Only `start()` (first cycle) and `get()` hand these to callers; errors
/// from background cycles are logged and select the retry cadence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("refresher {0} has no token yet")]
    NoTokenYet(String),

    #[error("refresher {name}: token fetch failed: {source}")]
    FetchFailed {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("refresher {name}: update callback failed: {source}")]
    CallbackFailed {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid refresh configuration: {0}")]
    ConfigInvalid(String),

    #[error("refresher {0} was stopped during a refresh")]
    StoppedRace(String),
}

/// Result alias for refresher operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failed_keeps_source() {
        let err = Error::FetchFailed {
            name: "IA-cli_x-app".into(),
            source: "connection reset".into(),
        };
        assert_eq!(
            err.to_string(),
            "refresher IA-cli_x-app: token fetch failed: connection reset"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("connection reset"));
    }

    #[test]
    fn no_token_yet_names_refresher() {
        let err = Error::NoTokenYet("PA-tenant-t1".into());
        assert!(err.to_string().contains("PA-tenant-t1"));
    }
}
