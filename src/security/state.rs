//! Mutable admission state shared by the gate, sweeper and admin API.

use std::time::Instant;

use crate::security::denylist::Denylist;
use crate::security::rate_limit::FixedWindowLimiter;

/// Rate windows and denylist, owned explicitly and injected into the gate.
///
/// Created empty at startup; nothing here is persisted.
#[derive(Debug, Default)]
pub struct GateState {
    pub limiter: FixedWindowLimiter,
    pub denylist: Denylist,
}

/// Entries removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub windows: usize,
    pub denylist: usize,
}

impl GateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every window and denylist entry.
    pub fn reset(&self) {
        self.limiter.clear();
        self.denylist.clear();
    }

    /// Evict expired windows and denylist entries.
    pub fn sweep(&self, now: Instant) -> SweepReport {
        SweepReport {
            windows: self.limiter.sweep_expired(now),
            denylist: self.denylist.sweep_expired(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::rate_limit::LimiterClass;
    use std::time::Duration;

    #[test]
    fn test_reset_and_sweep() {
        let state = GateState::new();
        let now = Instant::now();
        let class = LimiterClass {
            max_requests: 2,
            window: Duration::from_secs(1),
        };

        state.limiter.try_acquire("a", "general", &class, now).unwrap();
        state.denylist.insert("b", "xss", now, Some(Duration::from_secs(10)));
        state.denylist.insert("c", "xss", now, None);

        let report = state.sweep(now + Duration::from_secs(5));
        assert_eq!(report, SweepReport { windows: 1, denylist: 0 });

        let report = state.sweep(now + Duration::from_secs(11));
        assert_eq!(report, SweepReport { windows: 0, denylist: 1 });

        state.reset();
        assert!(state.limiter.is_empty());
        assert!(state.denylist.is_empty());
    }
}
