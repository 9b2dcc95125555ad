//! Fixed-window request limiting keyed by client identifier.
//!
//! Counters live behind the [`CounterStore`] trait so multi-instance
//! deployments can swap the process-local [`MemoryStore`] for a shared
//! store; the in-memory map is only correct for a single instance. Expired
//! windows are garbage-collected by [`RateLimiter::sweep`], which the
//! server runs on a timer.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
const EXTRACTION_MAX_REQUESTS: u32 = 5;
const BILLING_MAX_REQUESTS: u32 = 10;

/// Limits for one guarded endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Extraction gate: 5 requests per minute. Reads `RATE_LIMIT_AI` to
    /// override the request count; unparseable values fall back to the
    /// default.
    pub fn extraction_from_env() -> Self {
        let max_requests = std::env::var("RATE_LIMIT_AI")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(EXTRACTION_MAX_REQUESTS);
        Self::new(max_requests, DEFAULT_WINDOW)
    }

    /// Billing gate: 10 charge creations per minute.
    pub const fn billing() -> Self {
        Self::new(BILLING_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

/// Quota snapshot for one identifier, without consuming a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests left in the current window (0 floor).
    pub remaining: u32,
    /// Time until the window rolls over; a full window when no entry is
    /// active.
    pub reset_in: Duration,
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

impl WindowEntry {
    /// An entry is active up to and including its reset instant.
    fn active(&self, now: Instant) -> bool {
        now <= self.reset_at
    }
}

/// Storage behind [`RateLimiter`].
pub trait CounterStore: Send + Sync {
    /// Records one request and reports whether it fits inside the window.
    fn hit(&self, identifier: &str, config: &RateLimitConfig, now: Instant) -> Result<bool>;

    /// Remaining quota for the identifier.
    fn info(&self, identifier: &str, config: &RateLimitConfig, now: Instant)
        -> Result<RateLimitInfo>;

    /// Drops the identifier's window.
    fn reset(&self, identifier: &str) -> Result<()>;

    /// Drops every expired window, returning how many were removed.
    fn sweep(&self, now: Instant) -> Result<usize>;
}

/// Process-local counter store.
#[derive(Default)]
pub struct MemoryStore {
    windows: RwLock<HashMap<String, WindowEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryStore {
    fn hit(&self, identifier: &str, config: &RateLimitConfig, now: Instant) -> Result<bool> {
        let mut windows = self
            .windows
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire rate limit store lock".into()))?;

        match windows.get_mut(identifier) {
            Some(entry) if entry.active(now) => {
                if entry.count < config.max_requests {
                    entry.count += 1;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            _ => {
                windows.insert(
                    identifier.to_string(),
                    WindowEntry {
                        count: 1,
                        reset_at: now + config.window,
                    },
                );
                Ok(true)
            }
        }
    }

    fn info(
        &self,
        identifier: &str,
        config: &RateLimitConfig,
        now: Instant,
    ) -> Result<RateLimitInfo> {
        let windows = self
            .windows
            .read()
            .map_err(|_| Error::InvalidData("Failed to acquire rate limit store lock".into()))?;

        match windows.get(identifier) {
            Some(entry) if entry.active(now) => Ok(RateLimitInfo {
                remaining: config.max_requests.saturating_sub(entry.count),
                reset_in: entry.reset_at.duration_since(now),
            }),
            _ => Ok(RateLimitInfo {
                remaining: config.max_requests,
                reset_in: config.window,
            }),
        }
    }

    fn reset(&self, identifier: &str) -> Result<()> {
        self.windows
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire rate limit store lock".into()))?
            .remove(identifier);
        Ok(())
    }

    fn sweep(&self, now: Instant) -> Result<usize> {
        let mut windows = self
            .windows
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire rate limit store lock".into()))?;
        let before = windows.len();
        windows.retain(|_, entry| entry.active(now));
        Ok(before - windows.len())
    }
}

/// Request gate shared by the extraction and billing endpoints.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    /// Limiter over a process-local [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Records one request from `identifier`, reporting whether it is
    /// allowed under `config`.
    pub fn check(&self, identifier: &str, config: &RateLimitConfig) -> Result<bool> {
        self.check_at(identifier, config, Instant::now())
    }

    pub fn check_at(
        &self,
        identifier: &str,
        config: &RateLimitConfig,
        now: Instant,
    ) -> Result<bool> {
        self.store.hit(identifier, config, now)
    }

    /// Quota left for `identifier` without consuming a request.
    pub fn info(&self, identifier: &str, config: &RateLimitConfig) -> Result<RateLimitInfo> {
        self.info_at(identifier, config, Instant::now())
    }

    pub fn info_at(
        &self,
        identifier: &str,
        config: &RateLimitConfig,
        now: Instant,
    ) -> Result<RateLimitInfo> {
        self.store.info(identifier, config, now)
    }

    /// Forgets everything recorded for `identifier`.
    pub fn reset(&self, identifier: &str) -> Result<()> {
        self.store.reset(identifier)
    }

    /// Garbage-collects expired windows, returning how many were dropped.
    pub fn sweep(&self) -> Result<usize> {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> Result<usize> {
        self.store.sweep(now)
    }
}
