//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build gate → Start sweeper/watcher → Bind listeners
//!
//! Running (sweeper.rs):
//!     Every interval → evict expired windows and denylist entries
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → broadcast → servers drain, background tasks exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then gate, then listeners
//! - Every background task listens on the same shutdown broadcast

pub mod shutdown;
pub mod sweeper;

pub use shutdown::Shutdown;
pub use sweeper::Sweeper;
