//! HTTP surfaces of the gate.
//!
//! # Data Flow
//! ```text
//! Protecting a router (middleware.rs):
//!     Request → identity + class + buffered body → gate.assess
//!         Allow → inner service
//!         Deny  → 429 / 400 / 403 / 500
//!
//! Decision service (server.rs):
//!     POST /v1/admission (JSON descriptor) → gate.assess → JSON decision
//! ```

pub mod middleware;
pub mod server;

pub use middleware::admission_middleware;
pub use server::{AdmissionResponse, HttpServer};
