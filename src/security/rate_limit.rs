//! Fixed-window, per-client request quota.
//!
//! Each key owns a window `[start, reset_at)` holding at most `max_requests`
//! admissions. A window that has reached `reset_at` is replaced on the next
//! observation instead of being incremented.
//!
//! State is per-process and in-memory. A multi-instance deployment needs a
//! shared store behind the same `check` interface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use serde::Serialize;

use crate::clock::{duration_millis, millis_to_secs_ceil, Clock, SystemClock};
use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Limits applied by a [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window: Duration,
    pub sweep_interval: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
        }
    }
}

impl From<&RateLimitConfig> for RateLimitSettings {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window(),
            sweep_interval: config.sweep_interval(),
        }
    }
}

/// Result of consuming one request from a client's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// When the window resets, in Unix seconds.
    pub reset_at: u64,
    /// Whole seconds until the window resets, rounded up. Never exceeds the
    /// window length.
    pub retry_after: u64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at_ms: u64,
}

impl Window {
    fn fresh(now_ms: u64, window: Duration) -> Self {
        Self {
            count: 0,
            reset_at_ms: now_ms.saturating_add(duration_millis(window)),
        }
    }

    fn consume(&mut self, max_requests: u32, now_ms: u64) -> RateLimitDecision {
        let reset_at = millis_to_secs_ceil(self.reset_at_ms);
        let retry_after = millis_to_secs_ceil(self.reset_at_ms.saturating_sub(now_ms));
        if self.count >= max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at,
                retry_after,
            };
        }
        self.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: max_requests - self.count,
            reset_at,
            retry_after,
        }
    }
}

struct Inner {
    entries: DashMap<String, Window>,
    settings: RateLimitSettings,
    clock: Arc<dyn Clock>,
    sweeping: AtomicBool,
}

impl Inner {
    fn sweep_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.entries.len();
        // retain locks one shard at a time, so unrelated keys stay available.
        self.entries.retain(|_, window| now < window.reset_at_ms);
        let after = self.entries.len();
        metrics::record_rate_limit_keys(after);
        before.saturating_sub(after)
    }
}

/// Shared, cloneable rate-limit store.
///
/// Clones share state. The background sweeper holds only a weak reference and
/// exits once the store is empty or every clone has been dropped.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: RateLimitSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                settings,
                clock,
                sweeping: AtomicBool::new(false),
            }),
        }
    }

    pub fn settings(&self) -> RateLimitSettings {
        self.inner.settings
    }

    /// Consume one request for `key`.
    ///
    /// The read-modify-write runs under the key's shard lock, so concurrent
    /// callers sharing a key can never be admitted past `max_requests`.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let settings = self.inner.settings;
        let now = self.inner.clock.now_millis();

        let (decision, inserted) = {
            let (mut window, inserted) = match self.inner.entries.entry(key.to_owned()) {
                MapEntry::Occupied(occupied) => (occupied.into_ref(), false),
                MapEntry::Vacant(vacant) => {
                    (vacant.insert(Window::fresh(now, settings.window)), true)
                }
            };
            if now >= window.reset_at_ms {
                *window = Window::fresh(now, settings.window);
            }
            (window.consume(settings.max_requests, now), inserted)
        };

        if inserted {
            metrics::record_rate_limit_keys(self.inner.entries.len());
        }

        if !self.inner.sweeping.load(Ordering::SeqCst) {
            self.ensure_sweeper();
        }

        if !decision.allowed {
            tracing::warn!(client = %key, reset_at = decision.reset_at, "Rate limit exceeded");
        }
        decision
    }

    /// Forget a key's window.
    pub fn reset(&self, key: &str) -> bool {
        let removed = self.inner.entries.remove(key).is_some();
        if removed {
            metrics::record_rate_limit_keys(self.inner.entries.len());
        }
        removed
    }

    /// Drop expired windows now. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.inner.sweep_expired()
    }

    pub fn tracked_keys(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_sweeping(&self) -> bool {
        self.inner.sweeping.load(Ordering::SeqCst)
    }

    fn ensure_sweeper(&self) {
        if self
            .inner
            .sweeping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.inner.sweeping.store(false, Ordering::SeqCst);
            tracing::debug!("No async runtime; rate limit sweeping deferred");
            return;
        };

        let interval = self.inner.settings.sweep_interval;
        tracing::debug!(interval_secs = interval.as_secs(), "Rate limit sweeper started");
        handle.spawn(sweep_loop(Arc::downgrade(&self.inner), interval));
    }
}

async fn sweep_loop(store: Weak<Inner>, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;

        let Some(inner) = store.upgrade() else {
            return;
        };

        let removed = inner.sweep_expired();
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = inner.entries.len(),
                "Swept expired rate limit windows"
            );
        }

        if inner.entries.is_empty() {
            inner.sweeping.store(false, Ordering::SeqCst);
            // A key may have been inserted between the sweep and the flag store;
            // either its check restarts a sweeper or this one keeps going.
            let resumed = !inner.entries.is_empty()
                && inner
                    .sweeping
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok();
            if !resumed {
                tracing::debug!("Rate limit store empty, sweeper stopped");
                return;
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("settings", &self.inner.settings)
            .field("tracked_keys", &self.inner.entries.len())
            .field("sweeping", &self.is_sweeping())
            .finish()
    }
}
