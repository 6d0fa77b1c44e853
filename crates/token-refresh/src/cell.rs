//! Versioned token cell
//!
//! Readers load an `Arc<CachedToken>` without locking; the writer swaps in a
//! whole new value, so a reader sees either the previous token/expiry pair
//! or the new one, never a mix. `None` means no fetch has succeeded yet.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::time::Instant;

use crate::config::GUARD_BAND;
use crate::source::IssuedToken;

/// A committed token with its expiry and commit generation.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
    value: String,
    expires_at: Instant,
    generation: u64,
}

impl CachedToken {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// 1 for the first committed token, incremented on every commit.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `now` falls inside the guard band (or past expiry).
    pub fn needs_refresh(&self, now: Instant) -> bool {
        match self.expires_at.checked_sub(GUARD_BAND) {
            Some(refresh_at) => now >= refresh_at,
            None => true,
        }
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Lock-free holder of the current token.
#[derive(Default)]
pub struct TokenCell {
    slot: ArcSwapOption<CachedToken>,
}

impl TokenCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token, if any.
    pub fn load(&self) -> Option<Arc<CachedToken>> {
        self.slot.load_full()
    }

    /// Commit a new token and return it.
    ///
    /// Callers serialize writes (the refresher holds its lifecycle lock), so
    /// reading the previous generation and storing the next is not racy.
    pub fn store(&self, issued: IssuedToken) -> Arc<CachedToken> {
        let generation = self.load().map_or(0, |current| current.generation) + 1;
        let token = Arc::new(CachedToken {
            value: issued.value,
            expires_at: issued.expires_at,
            generation,
        });
        self.slot.store(Some(Arc::clone(&token)));
        token
    }
}

impl fmt::Debug for TokenCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCell")
            .field("current", &self.load())
            .finish()
    }
}
