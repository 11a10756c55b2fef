//! Request admission gate.
//!
//! Decides, per inbound request, whether it may proceed. A request is denied
//! when its identity is denylisted, when it exceeds its limiter class's
//! fixed-window budget, or when its URL, headers, user agent or body match a
//! known attack pattern. A threat match also denylists the identity.
//!
//! The gate can be embedded directly ([`AdmissionGate::evaluate`]), placed in
//! front of an Axum router ([`http::admission_middleware`]) or run as a
//! standalone decision service (the `admission-gate` binary).

// Core
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod security;

// Surfaces
pub mod admin;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::GateConfig;
pub use error::{GateError, GateResult};
pub use gate::{AdmissionGate, Assessment, Decision, DenyReason, RequestBody, RequestDescriptor};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
