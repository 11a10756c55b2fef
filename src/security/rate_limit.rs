//! Fixed-window rate limiting keyed by identity and limiter class.
//!
//! Windows live in a sharded concurrent map. The read-check-increment for one
//! key runs while holding that key's shard write lock, so two concurrent
//! requests at the boundary can never both be admitted past the limit, while
//! keys on other shards proceed in parallel.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::schema::LimiterClassConfig;
use crate::error::{GateError, GateResult};

/// Resolved limits of one limiter class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterClass {
    pub max_requests: u32,
    pub window: Duration,
}

impl From<LimiterClassConfig> for LimiterClass {
    fn from(config: LimiterClassConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_millis(config.window_ms),
        }
    }
}

/// Map key: one window per identity per class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WindowKey {
    identity: String,
    class: String,
}

impl WindowKey {
    fn new(identity: &str, class: &str) -> Self {
        Self {
            identity: identity.to_string(),
            class: class.to_string(),
        }
    }
}

/// Counter for one (identity, class) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub reset_at: Instant,
}

impl RateWindow {
    fn fresh(now: Instant, window: Duration) -> Option<Self> {
        Some(Self {
            count: 0,
            reset_at: now.checked_add(window)?,
        })
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.reset_at
    }
}

/// Outcome of charging one request against a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Request counted; `remaining` more fit in this window.
    Admitted { count: u32, remaining: u32 },
    /// Window is full and the request was not counted.
    Limited { retry_after: Duration },
}

/// Per-identity fixed-window counters.
#[derive(Debug, Default)]
pub struct FixedWindowLimiter {
    windows: DashMap<WindowKey, RateWindow>,
}

impl FixedWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charge one request for `identity` against `class`.
    ///
    /// Fails, leaving no state behind, when the window end cannot be
    /// represented as an `Instant`.
    pub fn try_acquire(
        &self,
        identity: &str,
        class_name: &str,
        class: &LimiterClass,
        now: Instant,
    ) -> GateResult<Admission> {
        let overflow = || GateError::WindowOverflow(class_name.to_string());

        let mut window = match self.windows.entry(WindowKey::new(identity, class_name)) {
            Entry::Occupied(occupied) => occupied.into_ref(),
            Entry::Vacant(vacant) => {
                vacant.insert(RateWindow::fresh(now, class.window).ok_or_else(overflow)?)
            }
        };

        if window.is_expired(now) {
            *window = RateWindow::fresh(now, class.window).ok_or_else(overflow)?;
        }

        if window.count >= class.max_requests {
            return Ok(Admission::Limited {
                retry_after: window.reset_at.saturating_duration_since(now),
            });
        }

        window.count += 1;
        Ok(Admission::Admitted {
            count: window.count,
            remaining: class.max_requests - window.count,
        })
    }

    /// Snapshot of a window, as stored (not reset on read).
    pub fn window(&self, identity: &str, class_name: &str) -> Option<RateWindow> {
        self.windows
            .get(&WindowKey::new(identity, class_name))
            .map(|w| *w.value())
    }

    /// Number of tracked windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Drop windows that have expired. Returns how many were removed.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.windows.retain(|_, window| {
            let keep = !window.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn clear(&self) {
        self.windows.clear();
    }
}
