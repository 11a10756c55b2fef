//! Admission decisions.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    RateLimited,
    ThreatDetected,
    DenylistedIdentity,
    InternalError,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::RateLimited => "rate_limited",
            DenyReason::ThreatDetected => "threat_detected",
            DenyReason::DenylistedIdentity => "denylisted_identity",
            DenyReason::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny { reason: DenyReason, message: String },
}

impl Decision {
    pub fn deny(reason: DenyReason, message: impl Into<String>) -> Self {
        Decision::Deny {
            reason,
            message: message.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny { reason, .. } => Some(*reason),
        }
    }

    /// Metric label for this outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny { reason, .. } => reason.as_str(),
        }
    }
}

/// A decision plus the context an HTTP caller needs to respond.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub decision: Decision,
    /// Limiter class the request was charged against, once resolved.
    pub limiter_class: Option<String>,
    /// Time until the window resets, for rate-limited requests.
    pub retry_after: Option<Duration>,
}

impl Assessment {
    pub(crate) fn allow(class: &str) -> Self {
        Self {
            decision: Decision::Allow,
            limiter_class: Some(class.to_string()),
            retry_after: None,
        }
    }

    pub(crate) fn deny(reason: DenyReason, message: &str) -> Self {
        Self {
            decision: Decision::deny(reason, message),
            limiter_class: None,
            retry_after: None,
        }
    }

    pub(crate) fn in_class(mut self, class: &str) -> Self {
        self.limiter_class = Some(class.to_string());
        self
    }

    pub(crate) fn retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }
}
