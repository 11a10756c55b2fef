//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, regex compilation)
//!     → GateConfig (validated, immutable)
//!     → compiled into the gate runtime
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → AdmissionGate::reconfigure swaps the whole runtime atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, ClassRouteConfig, DenylistConfig, EventConfig, GateConfig, HttpConfig,
    LimiterClassConfig, ObservabilityConfig, PatternGroupConfig, PatternTarget, SweeperConfig,
    ThreatConfig,
};
pub use validation::{validate_config, ValidationError, MAX_DENYLIST_TTL_SECS, MAX_WINDOW_MS};
