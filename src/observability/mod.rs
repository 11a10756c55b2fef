//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every evaluation produces one SecurityEvent:
//!     → event.rs (kind, severity, details)
//!     → sink.rs (tracing log, recent-event buffer, channel)
//!     → metrics.rs (decision and event counters)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON)
//!     → Admin API (recent events)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Events never carry raw request content
//! - Metrics are cheap (atomic increments)

pub mod event;
pub mod logging;
pub mod metrics;
pub mod sink;

pub use event::{EventKind, SecurityEvent, Severity};
pub use sink::{ChannelSink, EventSink, FanoutSink, RecentEvents, TracingSink};
