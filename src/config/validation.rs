//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (default class and class routes name existing classes)
//! - Validate value ranges (limits and windows > 0, sample rate in [0, 1])
//! - Compile every regex pattern once so a bad pattern is rejected up front
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use thiserror::Error;

use crate::config::schema::GateConfig;

/// Longest accepted limiter window: ten years.
pub const MAX_WINDOW_MS: u64 = 10 * 365 * 24 * 60 * 60 * 1000;

/// Longest accepted denylist TTL: ten years.
pub const MAX_DENYLIST_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// A single semantic problem in a `GateConfig`.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no limiter classes configured")]
    NoLimiterClasses,

    #[error("default class '{0}' is not a configured limiter class")]
    UnknownDefaultClass(String),

    #[error("limiter class '{0}' must allow at least one request")]
    ZeroMaxRequests(String),

    #[error("limiter class '{0}' must have a window longer than 0ms")]
    ZeroWindow(String),

    #[error("limiter class '{0}' window exceeds {max}ms", max = MAX_WINDOW_MS)]
    WindowTooLarge(String),

    #[error("class route '{prefix}' references unknown limiter class '{class}'")]
    UnknownRouteClass { prefix: String, class: String },

    #[error("pattern group at index {0} has no name")]
    UnnamedPatternGroup(usize),

    #[error("pattern group '{0}' has no patterns")]
    EmptyPatternGroup(String),

    #[error("pattern group '{group}' contains an empty substring")]
    EmptySubstring { group: String },

    #[error("pattern group '{group}' has invalid regex '{pattern}': {source}")]
    InvalidRegex {
        group: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("allow sample rate {0} is outside [0, 1]")]
    InvalidSampleRate(f64),

    #[error("denylist ttl must be greater than 0 seconds")]
    ZeroDenylistTtl,

    #[error("denylist ttl {0}s exceeds {max}s", max = MAX_DENYLIST_TTL_SECS)]
    DenylistTtlTooLarge(u64),

    #[error("sweeper interval must be greater than 0 seconds")]
    ZeroSweepInterval,

    #[error("admin API is enabled with an empty api key")]
    EmptyAdminKey,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.limiter_classes.is_empty() {
        errors.push(ValidationError::NoLimiterClasses);
    } else if !config.limiter_classes.contains_key(&config.default_class) {
        errors.push(ValidationError::UnknownDefaultClass(config.default_class.clone()));
    }

    for (name, class) in &config.limiter_classes {
        if class.max_requests == 0 {
            errors.push(ValidationError::ZeroMaxRequests(name.clone()));
        }
        if class.window_ms == 0 {
            errors.push(ValidationError::ZeroWindow(name.clone()));
        } else if class.window_ms > MAX_WINDOW_MS {
            errors.push(ValidationError::WindowTooLarge(name.clone()));
        }
    }

    for route in &config.http.class_routes {
        if !config.limiter_classes.contains_key(&route.class) {
            errors.push(ValidationError::UnknownRouteClass {
                prefix: route.path_prefix.clone(),
                class: route.class.clone(),
            });
        }
    }

    for (index, group) in config.threats.groups.iter().enumerate() {
        if group.name.trim().is_empty() {
            errors.push(ValidationError::UnnamedPatternGroup(index));
        }
        if group.substrings.is_empty() && group.regexes.is_empty() {
            errors.push(ValidationError::EmptyPatternGroup(group.name.clone()));
        }
        if group.substrings.iter().any(|s| s.is_empty()) {
            errors.push(ValidationError::EmptySubstring {
                group: group.name.clone(),
            });
        }
        for pattern in &group.regexes {
            if let Err(source) = regex::Regex::new(pattern) {
                errors.push(ValidationError::InvalidRegex {
                    group: group.name.clone(),
                    pattern: pattern.clone(),
                    source,
                });
            }
        }
    }

    if let Some(rate) = config.events.allow_sample_rate {
        if !(0.0..=1.0).contains(&rate) {
            errors.push(ValidationError::InvalidSampleRate(rate));
        }
    }

    match config.denylist.ttl_secs {
        Some(0) => errors.push(ValidationError::ZeroDenylistTtl),
        Some(ttl) if ttl > MAX_DENYLIST_TTL_SECS => {
            errors.push(ValidationError::DenylistTtlTooLarge(ttl))
        }
        _ => {}
    }

    if config.sweeper.enabled && config.sweeper.interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::EmptyAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Render a list of validation errors as one comma-separated line.
pub fn join_errors(errors: &[ValidationError]) -> JoinedErrors<'_> {
    JoinedErrors(errors)
}

/// Display adapter returned by [`join_errors`].
pub struct JoinedErrors<'a>(&'a [ValidationError]);

impl fmt::Display for JoinedErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}
