//! Request admission gate.
//!
//! # Data Flow
//! ```text
//! RequestDescriptor
//!     → denylist check      (hit → Deny(DenylistedIdentity), nothing charged)
//!     → rate-limit check    (full → Deny(RateLimited), not counted)
//!     → threat detection    (hit → denylist identity, Deny(ThreatDetected))
//!     → Allow               (request stays charged)
//!
//! Exactly one SecurityEvent per evaluation → EventSink
//! ```
//!
//! # Design Decisions
//! - Cheapest checks first; the first failing check decides
//! - Fail secure: any internal error becomes Deny(InternalError)
//! - Configuration is compiled into an immutable runtime and swapped whole
//! - Mutable state is an injected `GateState`, never a global

pub mod decision;
pub mod request;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;

use crate::clock::{Clock, SystemClock};
use crate::config::schema::GateConfig;
use crate::config::validation::validate_config;
use crate::error::{GateError, GateResult};
use crate::observability::event::{EventKind, SecurityEvent};
use crate::observability::metrics;
use crate::observability::sink::{EventSink, TracingSink};
use crate::security::rate_limit::{Admission, LimiterClass};
use crate::security::state::GateState;
use crate::security::threat::ThreatDetector;

pub use decision::{Assessment, Decision, DenyReason};
pub use request::{RequestBody, RequestDescriptor};

const DENYLISTED_MESSAGE: &str = "Access denied";
const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later";
const THREAT_MESSAGE: &str = "Request blocked by security policy";
const INTERNAL_ERROR_MESSAGE: &str = "Request could not be evaluated";

/// Configuration compiled for evaluation.
struct GateRuntime {
    config: Arc<GateConfig>,
    classes: HashMap<String, LimiterClass>,
    detector: ThreatDetector,
    denylist_ttl: Option<Duration>,
}

impl GateRuntime {
    fn compile(config: GateConfig) -> GateResult<Self> {
        validate_config(&config).map_err(GateError::InvalidConfig)?;

        let detector = ThreatDetector::compile(&config.threats)
            .map_err(|e| GateError::InvalidConfig(vec![e]))?;
        let classes = config
            .limiter_classes
            .iter()
            .map(|(name, class)| (name.clone(), LimiterClass::from(*class)))
            .collect();
        let denylist_ttl = config.denylist.ttl_secs.map(Duration::from_secs);

        Ok(Self {
            config: Arc::new(config),
            classes,
            detector,
            denylist_ttl,
        })
    }

    fn class(&self, label: Option<&str>) -> GateResult<(&str, &LimiterClass)> {
        let name = label.unwrap_or(self.config.default_class.as_str());
        self.classes
            .get_key_value(name)
            .map(|(name, class)| (name.as_str(), class))
            .ok_or_else(|| GateError::UnknownLimiterClass(name.to_string()))
    }
}

/// Builder for [`AdmissionGate`].
pub struct GateBuilder {
    config: GateConfig,
    state: Option<Arc<GateState>>,
    sink: Option<Arc<dyn EventSink>>,
    clock: Option<Arc<dyn Clock>>,
}

impl GateBuilder {
    /// Share existing state instead of starting empty.
    pub fn state(mut self, state: Arc<GateState>) -> Self {
        self.state = Some(state);
        self
    }

    /// Event destination. Defaults to [`TracingSink`].
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and build the gate.
    pub fn build(self) -> GateResult<AdmissionGate> {
        let runtime = GateRuntime::compile(self.config)?;

        tracing::info!(
            classes = runtime.classes.len(),
            default_class = %runtime.config.default_class,
            pattern_groups = runtime.detector.group_names().count(),
            "Admission gate initialized"
        );

        Ok(AdmissionGate {
            runtime: ArcSwap::from_pointee(runtime),
            state: self.state.unwrap_or_default(),
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}

/// Decides whether inbound requests are admitted.
///
/// Safe to share across threads; `evaluate` never blocks on I/O.
///
/// ```
/// use admission_gate::{AdmissionGate, Decision, DenyReason, GateConfig, RequestDescriptor};
///
/// let gate = AdmissionGate::new(GateConfig::single_class("general", 2, 60_000)).unwrap();
/// let request = RequestDescriptor::new("203.0.113.5", "/");
///
/// assert_eq!(gate.evaluate(&request), Decision::Allow);
/// assert_eq!(gate.evaluate(&request), Decision::Allow);
/// assert_eq!(gate.evaluate(&request).deny_reason(), Some(DenyReason::RateLimited));
/// ```
pub struct AdmissionGate {
    runtime: ArcSwap<GateRuntime>,
    state: Arc<GateState>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl AdmissionGate {
    /// Gate with empty state, tracing sink and system clock.
    pub fn new(config: GateConfig) -> GateResult<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: GateConfig) -> GateBuilder {
        GateBuilder {
            config,
            state: None,
            sink: None,
            clock: None,
        }
    }

    /// Evaluate one request.
    pub fn evaluate(&self, request: &RequestDescriptor) -> Decision {
        self.assess(request).decision
    }

    /// Evaluate one request, returning the decision with its limiter context.
    pub fn assess(&self, request: &RequestDescriptor) -> Assessment {
        let runtime = self.runtime.load();
        let now = self.clock.now();

        let (assessment, event) = match self.check(&runtime, request, now) {
            Ok(checked) => checked,
            Err(err) => {
                let event = SecurityEvent::new(EventKind::EvaluationError, request.identity.as_str())
                    .with_detail("error", &err);
                (
                    Assessment::deny(DenyReason::InternalError, INTERNAL_ERROR_MESSAGE),
                    event,
                )
            }
        };

        self.emit(&runtime, &assessment, event);
        assessment
    }

    fn check(
        &self,
        runtime: &GateRuntime,
        request: &RequestDescriptor,
        now: Instant,
    ) -> GateResult<(Assessment, SecurityEvent)> {
        let identity = request.identity.as_str();

        if self.state.denylist.contains(identity, now) {
            let mut event = SecurityEvent::new(EventKind::BlockedSuspiciousIp, identity);
            if let Some(entry) = self.state.denylist.get(identity) {
                event = event.with_detail("reason", entry.reason);
            }
            return Ok((
                Assessment::deny(DenyReason::DenylistedIdentity, DENYLISTED_MESSAGE),
                event,
            ));
        }

        let (class_name, class) = runtime.class(request.limiter_class.as_deref())?;
        let remaining = match self.state.limiter.try_acquire(identity, class_name, class, now)? {
            Admission::Admitted { remaining, .. } => remaining,
            Admission::Limited { retry_after } => {
                let event = SecurityEvent::new(EventKind::RateLimitExceeded, identity)
                    .with_detail("class", class_name)
                    .with_detail("max_requests", class.max_requests)
                    .with_detail("window_ms", class.window.as_millis())
                    .with_detail("retry_after_ms", retry_after.as_millis());
                let assessment = Assessment::deny(DenyReason::RateLimited, RATE_LIMITED_MESSAGE)
                    .in_class(class_name)
                    .retry_after(retry_after);
                return Ok((assessment, event));
            }
        };

        let input = request.normalize()?;
        if let Some(threat) = runtime.detector.scan(&input) {
            let added = self
                .state
                .denylist
                .insert(identity, &threat.group, now, runtime.denylist_ttl);
            if added {
                self.publish_state_size();
            }
            let event = SecurityEvent::new(EventKind::SuspiciousPattern, identity)
                .with_detail("class", class_name)
                .with_detail("group", &threat.group)
                .with_detail("pattern", &threat.pattern)
                .with_detail("location", &threat.location)
                .with_detail("denylisted", added);
            let assessment =
                Assessment::deny(DenyReason::ThreatDetected, THREAT_MESSAGE).in_class(class_name);
            return Ok((assessment, event));
        }

        let event = SecurityEvent::new(EventKind::RequestAllowed, identity)
            .with_detail("class", class_name)
            .with_detail("remaining", remaining);
        Ok((Assessment::allow(class_name), event))
    }

    fn emit(&self, runtime: &GateRuntime, assessment: &Assessment, event: SecurityEvent) {
        metrics::record_decision(
            assessment.decision.outcome(),
            assessment.limiter_class.as_deref().unwrap_or("none"),
        );

        if assessment.decision.is_allowed() {
            if let Some(rate) = runtime.config.events.allow_sample_rate {
                if fastrand::f64() >= rate {
                    return;
                }
            }
        }

        metrics::record_event(event.kind().as_str(), event.severity().as_str());
        self.sink.record(event);
    }

    /// Replace the whole configuration atomically.
    ///
    /// Evaluations already running finish on the old configuration. Existing
    /// windows and denylist entries are kept.
    pub fn reconfigure(&self, config: GateConfig) -> GateResult<()> {
        let runtime = GateRuntime::compile(config)?;
        tracing::info!(
            classes = runtime.classes.len(),
            default_class = %runtime.config.default_class,
            "Gate configuration replaced"
        );
        self.runtime.store(Arc::new(runtime));
        Ok(())
    }

    /// Current configuration.
    pub fn config(&self) -> Arc<GateConfig> {
        self.runtime.load().config.clone()
    }

    pub fn state(&self) -> &Arc<GateState> {
        &self.state
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Denylist `identity` by hand. Returns `true` if it was not already listed.
    pub fn denylist_identity(&self, identity: &str, reason: &str) -> bool {
        let ttl = self.runtime.load().denylist_ttl;
        let added = self.state.denylist.insert(identity, reason, self.clock.now(), ttl);
        tracing::info!(identity = %identity, reason = %reason, added, "Identity denylisted manually");
        self.publish_state_size();
        added
    }

    /// Lift the denylist entry for `identity`.
    pub fn clear_denylisted(&self, identity: &str) -> bool {
        let removed = self.state.denylist.remove(identity);
        tracing::info!(identity = %identity, removed, "Denylist entry cleared");
        self.publish_state_size();
        removed
    }

    /// Lift every denylist entry. Returns how many were removed.
    pub fn clear_denylist(&self) -> usize {
        let removed = self.state.denylist.len();
        self.state.denylist.clear();
        tracing::info!(removed, "Denylist cleared");
        self.publish_state_size();
        removed
    }

    /// Forget all windows and denylist entries.
    pub fn reset(&self) {
        self.state.reset();
        tracing::info!("Gate state reset");
        self.publish_state_size();
    }

    /// Set the tracked-window and denylist gauges from current state.
    pub fn publish_state_size(&self) {
        metrics::record_state_size(self.state.limiter.len(), self.state.denylist.len());
    }
}
