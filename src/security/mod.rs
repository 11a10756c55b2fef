//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Each evaluation:
//!     → denylist.rs (identity already flagged?)
//!     → rate_limit.rs (charge the identity's fixed window)
//!     → threat.rs (scan normalized URL, headers, body)
//!     → flagged identities written back to denylist.rs
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - State (windows + denylist) lives in state.rs, owned by the caller

pub mod denylist;
pub mod rate_limit;
pub mod state;
pub mod threat;

pub use denylist::{Denylist, DenylistEntry};
pub use rate_limit::{Admission, FixedWindowLimiter, LimiterClass, RateWindow};
pub use state::{GateState, SweepReport};
pub use threat::{MatchLocation, ScanInput, ThreatDetector, ThreatMatch};
