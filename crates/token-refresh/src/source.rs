//! Token source abstraction
//!
//! A source performs the credential-issuing call. It is owned by exactly one
//! refresher and is only ever called from that refresher's cycle, so calls
//! never overlap for a given source.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::BoxError;

/// Longest validity accepted from a source. Larger values are clamped.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A token as returned by a source, with its absolute expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub value: String,
    pub expires_at: Instant,
}

impl IssuedToken {
    /// Token valid for `ttl` from now, clamped to `MAX_TOKEN_TTL`. Platforms
    /// report validity as a relative `expire` in seconds; this anchors it to
    /// the refresher clock.
    pub fn expiring_in(value: impl Into<String>, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value: value.into(),
            // An unrepresentable instant counts as already expired.
            expires_at: now.checked_add(ttl.min(MAX_TOKEN_TTL)).unwrap_or(now),
        }
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Boxed future returned by `TokenSource::fetch`.
pub type TokenFuture<'a> =
    Pin<Box<dyn Future<Output = Result<IssuedToken, BoxError>> + Send + 'a>>;

/// Capability that fetches a fresh token.
///
/// Uses `Pin<Box<dyn Future>>` so refreshers can hold `Box<dyn TokenSource>`.
pub trait TokenSource: Send + Sync + 'static {
    fn fetch(&self) -> TokenFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expiry_is_anchored_to_now() {
        let now = Instant::now();
        let token = IssuedToken::expiring_in("t", Duration::from_secs(7200));
        assert_eq!(token.expires_at, now + Duration::from_secs(7200));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_ttl_is_clamped() {
        let now = Instant::now();
        let token = IssuedToken::expiring_in("t", Duration::from_secs(u64::MAX));
        assert_eq!(token.expires_at, now + MAX_TOKEN_TTL);

        let token = IssuedToken::expiring_in("t", Duration::MAX);
        assert_eq!(token.expires_at, now + MAX_TOKEN_TTL);
    }

    #[test]
    fn debug_redacts_value() {
        let token = IssuedToken::expiring_in("secret-token", Duration::from_secs(1));
        assert!(!format!("{token:?}").contains("secret-token"));
    }
}
