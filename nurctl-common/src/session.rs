// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Connection lifecycle around a reader driver.
//!
//! [`ConnectionManager::acquire`] retries the connect sequence with a fixed
//! interval and hands out a [`Session`]. A session is disconnected exactly
//! once: either explicitly through [`Session::release`] or, if the caller
//! bails out early, when it is dropped. [`ConnectionManager::with_session`]
//! wraps an operation so that release happens on every exit path.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use log::{debug, info, warn};

use crate::driver::{Connector, DriverResult, ReaderDriver};
use crate::error::{Result, ToolError};
use crate::event::EventSink;
use crate::types::Mode;

/// Number of connect attempts before giving up.
pub const CONNECT_ATTEMPTS: u32 = 60;

/// Fixed wait between attempts.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(1000);

/// Bounded retry with a fixed interval (no backoff).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: CONNECT_ATTEMPTS,
            interval: RETRY_INTERVAL,
        }
    }
}

/// Interrupt flag shared with a signal handler.
///
/// Waiting on the token returns early once it has been cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        let mut cancelled = match flag.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *cancelled = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        match self.inner.0.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Block for `timeout` or until cancelled. Returns `true` if cancelled.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let guard = match flag.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let result = cvar.wait_timeout_while(guard, timeout, |cancelled| !*cancelled);
        match result {
            Ok((guard, _)) => *guard,
            Err(poisoned) => *poisoned.into_inner().0,
        }
    }
}

/// Run `attempt` until it yields a value, at most `policy.attempts` times.
///
/// Returns `Ok(None)` when all attempts are used up, and
/// [`ToolError::Interrupted`] if the token is cancelled during a wait.
pub fn retry<T>(
    policy: RetryPolicy,
    cancel: &CancelToken,
    mut attempt: impl FnMut(u32) -> Option<T>,
) -> Result<Option<T>> {
    for n in 1..=policy.attempts {
        if let Some(value) = attempt(n) {
            return Ok(Some(value));
        }
        if n < policy.attempts && cancel.wait(policy.interval) {
            return Err(ToolError::Interrupted);
        }
    }
    Ok(None)
}

/// Wait for a device node to appear, retrying discovery with `policy`.
pub fn wait_for_device(
    prefix: &str,
    count: u32,
    policy: RetryPolicy,
    cancel: &CancelToken,
) -> Result<PathBuf> {
    retry(policy, cancel, |n| {
        let found = crate::locate::locate(prefix, count);
        if found.is_none() {
            debug!("No device found ({}/{})", n, policy.attempts);
        }
        found
    })?
    .ok_or(ToolError::NoDevice)
}

/// An open, connected driver handle.
pub struct Session<D: ReaderDriver> {
    path: PathBuf,
    mode: Mode,
    driver: D,
    released: bool,
}

impl<D: ReaderDriver> Session<D> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode reported by the module when the session was opened.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Disconnect, and with `cleanup` also unregister the listener and
    /// dispose the driver.
    pub fn release(mut self, cleanup: bool) -> DriverResult<()> {
        self.release_inner(cleanup)
    }

    fn release_inner(&mut self, cleanup: bool) -> DriverResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        info!("Disconnecting");
        let result = self.driver.disconnect();

        if cleanup {
            info!("Cleaning up");
            self.driver.set_listener(None);
            self.driver.dispose();
        }
        result
    }
}

impl<D: ReaderDriver> Drop for Session<D> {
    fn drop(&mut self) {
        if let Err(e) = self.release_inner(true) {
            warn!("Disconnect failed: {}", e);
        }
    }
}

/// Owns the connect retry loop and the session lifecycle.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    policy: RetryPolicy,
    cancel: CancelToken,
    sink: Arc<dyn EventSink>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, sink: Arc<dyn EventSink>) -> Self {
        Self {
            connector,
            policy: RetryPolicy::default(),
            cancel: CancelToken::new(),
            sink,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Open a session on `path`, retrying the whole connect sequence.
    pub fn acquire(&mut self, path: &Path) -> Result<Session<C::Driver>> {
        let policy = self.policy;
        let cancel = self.cancel.clone();

        let session = retry(policy, &cancel, |n| match self.try_connect(path) {
            Ok(session) => Some(session),
            Err(e) => {
                info!(
                    "Connection failed ({}). Retry: {}/{}",
                    e, n, policy.attempts
                );
                None
            }
        })?;

        session.ok_or(ToolError::NoDevice)
    }

    fn try_connect(&mut self, path: &Path) -> DriverResult<Session<C::Driver>> {
        info!("Opening {}", path.display());
        let mut driver = self.connector.open(path)?;

        driver.set_listener(Some(Arc::clone(&self.sink)));

        info!("Connecting");
        if let Err(e) = driver.connect() {
            driver.set_listener(None);
            driver.dispose();
            return Err(e);
        }

        let mode = match identify(&mut driver) {
            Ok(mode) => mode,
            Err(e) => {
                if let Err(disconnect_err) = driver.disconnect() {
                    warn!("Disconnect failed: {}", disconnect_err);
                }
                driver.set_listener(None);
                driver.dispose();
                return Err(e);
            }
        };

        Ok(Session {
            path: path.to_path_buf(),
            mode,
            driver,
            released: false,
        })
    }

    /// Acquire a session, run `op` on it, and release it whatever the
    /// outcome. The operation's error takes precedence over a release error.
    pub fn with_session<T>(
        &mut self,
        path: &Path,
        op: impl FnOnce(&mut Session<C::Driver>) -> Result<T>,
    ) -> Result<T> {
        let mut session = self.acquire(path)?;
        let outcome = op(&mut session);
        let released = session.release(true);

        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release_err)) => {
                warn!("Disconnect failed: {}", release_err);
                Err(e)
            }
        }
    }
}

fn identify<D: ReaderDriver>(driver: &mut D) -> DriverResult<Mode> {
    let mode = driver.mode()?;
    match mode {
        Mode::Application => {
            info!("Running in application mode");
            let version = driver.reader_info()?.sw_version;
            info!("Current firmware version: {}", version);
        }
        Mode::Bootloader => {
            info!("Running in boot loader mode");
            let version = driver.reader_info()?.sw_version;
            info!("Current boot loader version: {}", version);
        }
        Mode::Unknown => warn!("Module reported an unknown mode"),
    }
    Ok(mode)
}
