//! Refresh scheduler
//!
//! One `TokenRefresher` keeps one token fresh. State shared between readers
//! and the timer task is limited to the token cell (lock-free) and the
//! lifecycle (running flag, epoch, pending timer) behind a single mutex.
//!
//! Every armed timer carries the epoch it was armed under. `stop()` bumps the
//! epoch and aborts the pending timer, so a cycle that is already executing
//! finds its epoch stale at the next checkpoint (commit, callback, re-arm)
//! and exits without touching shared state. An update callback that has
//! already begun when `stop()` is called runs to completion; a cycle that
//! observes the stop first skips the callback.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cell::{CachedToken, TokenCell};
use crate::config::RefreshConfig;
use crate::error::{BoxError, Error, Result};
use crate::metrics::{self as telemetry, CycleOutcome};
use crate::source::{IssuedToken, TokenSource};

/// Called with every token the refresher considers current, including
/// unchanged ones. An error switches the next cycle to the retry cadence.
pub type UpdateCallback = Arc<dyn Fn(&str) -> std::result::Result<(), BoxError> + Send + Sync>;

#[derive(Default)]
struct Lifecycle {
    running: bool,
    epoch: u64,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    name: String,
    source: Box<dyn TokenSource>,
    on_update: UpdateCallback,
    config: RefreshConfig,
    cell: TokenCell,
    lifecycle: Mutex<Lifecycle>,
}

/// Keeps one access token fresh in the background.
///
/// `get()` never blocks on I/O. Dropping the refresher stops it.
pub struct TokenRefresher {
    inner: Arc<Inner>,
}

/// Builder for `TokenRefresher`.
pub struct RefresherBuilder {
    name: String,
    source: Box<dyn TokenSource>,
    on_update: UpdateCallback,
    config: RefreshConfig,
}

impl RefresherBuilder {
    pub fn config(mut self, config: RefreshConfig) -> Self {
        self.config = config;
        self
    }

    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_update = Arc::new(callback);
        self
    }

    /// Shared form of `on_update`, for callbacks already behind an `Arc`.
    pub fn on_update_shared(mut self, callback: UpdateCallback) -> Self {
        self.on_update = callback;
        self
    }

    /// Build a stopped refresher. Nothing is fetched until `start()`.
    pub fn build(self) -> TokenRefresher {
        TokenRefresher {
            inner: Arc::new(Inner {
                name: self.name,
                source: self.source,
                on_update: self.on_update,
                config: self.config,
                cell: TokenCell::new(),
                lifecycle: Mutex::new(Lifecycle::default()),
            }),
        }
    }
}

impl TokenRefresher {
    /// Start building a refresher named `name` (used in logs and metrics).
    pub fn builder(name: impl Into<String>, source: impl TokenSource) -> RefresherBuilder {
        RefresherBuilder {
            name: name.into(),
            source: Box::new(source),
            on_update: Arc::new(|_: &str| -> std::result::Result<(), BoxError> { Ok(()) }),
            config: RefreshConfig::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> RefreshConfig {
        self.inner.config
    }

    /// Arm the refresher and run the first cycle inline.
    ///
    /// No-op if already running. Returns the first cycle's error; the retry
    /// timer is armed regardless, so a failed start heals on its own.
    pub async fn start(&self) -> Result<()> {
        let Some((epoch, last)) = self.inner.arm() else {
            debug!(refresher = %self.inner.name, "refresher already running");
            return Ok(());
        };
        info!(refresher = %self.inner.name, "starting token refresher");

        // If this future is dropped mid-cycle, release the arm so a later
        // start() is not mistaken for a no-op.
        let mut guard = ArmGuard {
            inner: &self.inner,
            epoch,
            settled: false,
        };
        let result = Arc::clone(&self.inner).run_cycle(epoch, last).await;
        guard.settled = true;

        match result {
            Err(Error::StoppedRace(_)) => Ok(()),
            other => other,
        }
    }

    /// Last committed token, or `NoTokenYet` before the first success.
    pub fn get(&self) -> Result<String> {
        self.inner
            .cell
            .load()
            .map(|token| token.value().to_owned())
            .ok_or_else(|| Error::NoTokenYet(self.inner.name.clone()))
    }

    /// Last committed token with its expiry and generation.
    pub fn snapshot(&self) -> Option<Arc<CachedToken>> {
        self.inner.cell.load()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lifecycle().running
    }

    /// Stop refreshing. Idempotent.
    pub fn stop(&self) {
        if self.inner.disarm() {
            info!(refresher = %self.inner.name, "token refresher stopped");
        }
    }
}

impl Drop for TokenRefresher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("name", &self.inner.name)
            .field("config", &self.inner.config)
            .field("token", &self.inner.cell.load())
            .finish_non_exhaustive()
    }
}

struct ArmGuard<'a> {
    inner: &'a Inner,
    epoch: u64,
    settled: bool,
}

impl Drop for ArmGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.inner.abandon(self.epoch);
        }
    }
}

impl Inner {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stopped -> Armed. Returns the new epoch and the token to start from,
    /// or `None` if already running.
    fn arm(&self) -> Option<(u64, Option<Arc<CachedToken>>)> {
        let mut lifecycle = self.lifecycle();
        if lifecycle.running {
            return None;
        }
        lifecycle.running = true;
        lifecycle.epoch += 1;
        lifecycle.timer = None;
        Some((lifecycle.epoch, self.cell.load()))
    }

    /// Armed -> Stopped. Returns false if already stopped.
    fn disarm(&self) -> bool {
        let mut lifecycle = self.lifecycle();
        if !lifecycle.running {
            return false;
        }
        lifecycle.running = false;
        lifecycle.epoch += 1;
        if let Some(timer) = lifecycle.timer.take() {
            timer.abort();
        }
        true
    }

    /// Undo an `arm()` whose startup cycle never finished.
    fn abandon(&self, epoch: u64) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.running && lifecycle.epoch == epoch && lifecycle.timer.is_none() {
            lifecycle.running = false;
            lifecycle.epoch += 1;
            warn!(refresher = %self.name, "startup refresh cancelled, refresher left stopped");
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        let lifecycle = self.lifecycle();
        lifecycle.running && lifecycle.epoch == epoch
    }

    fn stopped_race(&self) -> Error {
        Error::StoppedRace(self.name.clone())
    }

    /// Publish a fetched token, unless the epoch went stale while fetching.
    fn commit(&self, epoch: u64, issued: IssuedToken) -> Option<Arc<CachedToken>> {
        let lifecycle = self.lifecycle();
        if !lifecycle.running || lifecycle.epoch != epoch {
            return None;
        }
        let token = self.cell.store(issued);
        telemetry::set_available(&self.name, true);
        Some(token)
    }

    /// One full cycle: refresh, log, re-arm.
    async fn run_cycle(self: Arc<Self>, epoch: u64, last: Option<Arc<CachedToken>>) -> Result<()> {
        let (current, result) = self.refresh(epoch, last).await;

        let outcome = match &result {
            Ok(()) => CycleOutcome::Ok,
            Err(Error::FetchFailed { .. }) => CycleOutcome::FetchFailed,
            Err(Error::CallbackFailed { .. }) => CycleOutcome::CallbackFailed,
            Err(_) => CycleOutcome::Stopped,
        };
        telemetry::record_cycle(&self.name, outcome);

        let delay = match &result {
            Ok(()) => self.config.update_interval(),
            Err(Error::StoppedRace(_)) => {
                debug!(refresher = %self.name, "refresher stopped mid-cycle, result discarded");
                return result;
            }
            Err(e) => {
                warn!(refresher = %self.name, error = %e, "token refresh failed");
                self.config.retry_interval()
            }
        };

        if !self.rearm(epoch, current, delay) {
            debug!(refresher = %self.name, "refresher stopped, not re-arming");
        }
        result
    }

    /// Fetch if due, then notify. Returns the token to carry into the next
    /// cycle along with the cycle's result.
    async fn refresh(
        &self,
        epoch: u64,
        last: Option<Arc<CachedToken>>,
    ) -> (Option<Arc<CachedToken>>, Result<()>) {
        if !self.is_current(epoch) {
            return (last, Err(self.stopped_race()));
        }

        let token = match last {
            Some(cached) if !cached.needs_refresh(Instant::now()) => cached,
            stale => {
                telemetry::record_fetch(&self.name);
                match self.source.fetch().await {
                    Ok(issued) => match self.commit(epoch, issued) {
                        Some(token) => {
                            info!(
                                refresher = %self.name,
                                generation = token.generation(),
                                expires_in_secs = token
                                    .expires_at()
                                    .saturating_duration_since(Instant::now())
                                    .as_secs(),
                                "token update ok"
                            );
                            token
                        }
                        None => return (stale, Err(self.stopped_race())),
                    },
                    Err(source) => {
                        let err = Error::FetchFailed {
                            name: self.name.clone(),
                            source,
                        };
                        return (stale, Err(err));
                    }
                }
            }
        };

        if !self.is_current(epoch) {
            return (Some(token), Err(self.stopped_race()));
        }

        let result = (self.on_update)(token.value()).map_err(|source| Error::CallbackFailed {
            name: self.name.clone(),
            source,
        });
        (Some(token), result)
    }

    /// Arm the next one-shot timer for `epoch`. Returns false if stopped.
    fn rearm(
        self: &Arc<Self>,
        epoch: u64,
        current: Option<Arc<CachedToken>>,
        delay: Duration,
    ) -> bool {
        let mut lifecycle = self.lifecycle();
        if !lifecycle.running || lifecycle.epoch != epoch {
            return false;
        }

        let inner = Arc::clone(self);
        lifecycle.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Errors are logged inside the cycle.
            let _ = inner.run_cycle(epoch, current).await;
        }));
        debug!(
            refresher = %self.name,
            delay_ms = delay.as_millis() as u64,
            "next refresh armed"
        );
        true
    }
}
