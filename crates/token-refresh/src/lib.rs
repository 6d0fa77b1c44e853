//! Background refresh of short-lived access tokens
//!
//! A `TokenRefresher` owns one token's lifecycle: it fetches the token from
//! a pluggable `TokenSource`, caches it in a lock-free cell, and re-checks
//! it on a timer so readers always find a valid value without touching the
//! network.
//!
//! Lifecycle:
//! 1. `start()` arms the refresher and runs the first cycle inline, so the
//!    caller sees a construction-time failure
//! 2. Each cycle re-fetches only inside the 10 minute guard band before
//!    expiry, then calls the update callback with the current value
//! 3. The next cycle is scheduled after `update_interval`, or after
//!    `retry_interval` if the fetch or the callback failed
//! 4. `stop()` aborts the pending timer; a cycle already running notices the
//!    stop before touching shared state and does not re-arm

pub mod cell;
pub mod config;
pub mod error;
pub mod metrics;
pub mod refresher;
pub mod source;

pub use cell::{CachedToken, TokenCell};
pub use config::{
    DEFAULT_RETRY_INTERVAL, DEFAULT_UPDATE_INTERVAL, GUARD_BAND, RefreshConfig,
};
pub use error::{BoxError, Error, Result};
pub use refresher::{RefresherBuilder, TokenRefresher, UpdateCallback};
pub use source::{IssuedToken, MAX_TOKEN_TTL, TokenFuture, TokenSource};
