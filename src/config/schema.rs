//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files, and
//! every section defaults so a minimal file only names what it changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the admission gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Limiter class applied when a request names none.
    pub default_class: String,

    /// Named rate-limit classes.
    pub limiter_classes: BTreeMap<String, LimiterClassConfig>,

    /// Threat detection pattern groups.
    pub threats: ThreatConfig,

    /// Denylist behaviour.
    pub denylist: DenylistConfig,

    /// Security event emission.
    pub events: EventConfig,

    /// Background eviction of stale state.
    pub sweeper: SweeperConfig,

    /// Decision service and middleware settings.
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        let mut limiter_classes = BTreeMap::new();
        limiter_classes.insert("general".to_string(), LimiterClassConfig::new(100, 60_000));
        limiter_classes.insert("api".to_string(), LimiterClassConfig::new(60, 60_000));
        limiter_classes.insert("auth".to_string(), LimiterClassConfig::new(5, 900_000));

        Self {
            default_class: "general".to_string(),
            limiter_classes,
            threats: ThreatConfig::default(),
            denylist: DenylistConfig::default(),
            events: EventConfig::default(),
            sweeper: SweeperConfig::default(),
            http: HttpConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl GateConfig {
    /// Configuration with a single limiter class used as the default.
    pub fn single_class(name: &str, max_requests: u32, window_ms: u64) -> Self {
        let mut limiter_classes = BTreeMap::new();
        limiter_classes.insert(name.to_string(), LimiterClassConfig::new(max_requests, window_ms));
        Self {
            default_class: name.to_string(),
            limiter_classes,
            ..Self::default()
        }
    }
}

/// Fixed-window limits for one limiter class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LimiterClassConfig {
    /// Requests admitted per window.
    pub max_requests: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl LimiterClassConfig {
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }
}

/// Threat detection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThreatConfig {
    /// Disable to skip content scanning entirely.
    pub enabled: bool,

    /// Pattern groups, checked in order.
    pub groups: Vec<PatternGroupConfig>,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            groups: vec![
                PatternGroupConfig::substrings(
                    "sql_injection",
                    PatternTarget::All,
                    &[
                        "union select",
                        "union all select",
                        "drop table",
                        "delete from",
                        "insert into",
                        "or 1=1",
                        "' or '1'='1",
                        "exec(",
                        "xp_cmdshell",
                    ],
                ),
                PatternGroupConfig::substrings(
                    "xss",
                    PatternTarget::All,
                    &[
                        "<script",
                        "javascript:",
                        "vbscript:",
                        "onload=",
                        "onerror=",
                        "onmouseover=",
                        "<iframe",
                    ],
                ),
                PatternGroupConfig::substrings(
                    "path_traversal",
                    PatternTarget::All,
                    &["../", "..\\", "/etc/passwd", "/etc/shadow", "c:\\windows\\system32"],
                ),
                PatternGroupConfig::substrings(
                    "scanner_user_agent",
                    PatternTarget::UserAgent,
                    &["sqlmap", "nikto", "nmap", "masscan", "dirbuster", "acunetix"],
                ),
            ],
        }
    }
}

/// One named group of threat indicators.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PatternGroupConfig {
    /// Group name, reported in events and denylist reasons.
    pub name: String,

    /// Which parts of the request the group scans.
    #[serde(default)]
    pub target: PatternTarget,

    /// Case-insensitive substrings.
    #[serde(default)]
    pub substrings: Vec<String>,

    /// Regular expressions, matched against lowercased content.
    #[serde(default)]
    pub regexes: Vec<String>,
}

impl PatternGroupConfig {
    pub fn substrings(name: &str, target: PatternTarget, patterns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            target,
            substrings: patterns.iter().map(|p| p.to_string()).collect(),
            regexes: Vec::new(),
        }
    }
}

/// Request parts scanned by a pattern group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTarget {
    /// URL, every header value and the body.
    #[default]
    All,
    /// Only the user-agent header.
    UserAgent,
}

/// Denylist configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DenylistConfig {
    /// Entry lifetime in seconds. `None` keeps entries until cleared.
    pub ttl_secs: Option<u64>,
}

/// Security event configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventConfig {
    /// Fraction of `Allow` decisions that emit an event (0.0 to 1.0).
    /// `None` emits one for every evaluation.
    pub allow_sample_rate: Option<f64>,

    /// Number of recent events retained for the admin API.
    pub recent_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            allow_sample_rate: None,
            recent_capacity: 256,
        }
    }
}

/// Sweeper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SweeperConfig {
    /// Run the background sweeper.
    pub enabled: bool,

    /// Seconds between sweeps.
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
        }
    }
}

/// HTTP settings shared by the decision service and the middleware.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Decision service bind address.
    pub bind_address: String,

    /// Header carrying the client identity (first comma-separated entry).
    /// Falls back to the peer address when absent.
    pub identity_header: String,

    /// Largest body buffered for scanning, in bytes.
    pub max_body_size: usize,

    /// Path prefixes mapped to limiter classes.
    pub class_routes: Vec<ClassRouteConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            identity_header: "x-forwarded-for".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            class_routes: Vec::new(),
        }
    }
}

/// Maps requests under `path_prefix` to a limiter class.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassRouteConfig {
    pub path_prefix: String,
    pub class: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
