//! Security event schema.
//!
//! One `SecurityEvent` describes the outcome of one evaluation. Events are
//! built by the gate, then moved into the sink; there are no setters after
//! construction. Details carry identifiers and matched patterns only, never
//! raw request content.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RequestAllowed,
    BlockedSuspiciousIp,
    RateLimitExceeded,
    SuspiciousPattern,
    EvaluationError,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::RequestAllowed => "request_allowed",
            EventKind::BlockedSuspiciousIp => "blocked_suspicious_ip",
            EventKind::RateLimitExceeded => "rate_limit_exceeded",
            EventKind::SuspiciousPattern => "suspicious_pattern",
            EventKind::EvaluationError => "evaluation_error",
        }
    }

    /// Fixed severity of each kind.
    pub fn severity(&self) -> Severity {
        match self {
            EventKind::RequestAllowed => Severity::Low,
            EventKind::RateLimitExceeded => Severity::Medium,
            EventKind::EvaluationError => Severity::High,
            EventKind::BlockedSuspiciousIp | EventKind::SuspiciousPattern => Severity::Critical,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one admission decision.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityEvent {
    id: Uuid,
    /// Milliseconds since the Unix epoch.
    timestamp_ms: u64,
    kind: EventKind,
    identity: String,
    severity: Severity,
    details: BTreeMap<String, String>,
}

impl SecurityEvent {
    /// New event stamped with the current wall-clock time. Severity follows
    /// from `kind`.
    pub fn new(kind: EventKind, identity: impl Into<String>) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            timestamp_ms,
            kind,
            identity: identity.into(),
            severity: kind.severity(),
            details: BTreeMap::new(),
        }
    }

    /// Attach a detail. Only used while the gate is assembling the event.
    pub fn with_detail(mut self, key: &str, value: impl ToString) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}
