//! Destinations for security events.
//!
//! The gate hands every event to one `EventSink`. Sinks must not block:
//! they log, enqueue, or append to memory and return.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::observability::event::{SecurityEvent, Severity};

/// Receives ownership of security events.
pub trait EventSink: Send + Sync {
    fn record(&self, event: SecurityEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn record(&self, event: SecurityEvent) {
        (**self).record(event)
    }
}

/// Writes events as structured tracing records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: SecurityEvent) {
        let details = serde_json::to_string(event.details()).unwrap_or_default();
        match event.severity() {
            Severity::Critical | Severity::High => tracing::error!(
                event_id = %event.id(),
                kind = %event.kind(),
                severity = %event.severity(),
                identity = %event.identity(),
                details = %details,
                "Security event"
            ),
            Severity::Medium => tracing::warn!(
                event_id = %event.id(),
                kind = %event.kind(),
                severity = %event.severity(),
                identity = %event.identity(),
                details = %details,
                "Security event"
            ),
            Severity::Low => tracing::debug!(
                event_id = %event.id(),
                kind = %event.kind(),
                identity = %event.identity(),
                details = %details,
                "Security event"
            ),
        }
    }
}

/// Keeps the most recent events in memory, oldest evicted first.
#[derive(Debug)]
pub struct RecentEvents {
    capacity: usize,
    events: Mutex<VecDeque<SecurityEvent>>,
}

impl RecentEvents {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Retained events, oldest first.
    pub fn snapshot(&self) -> Vec<SecurityEvent> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<SecurityEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventSink for RecentEvents {
    fn record(&self, event: SecurityEvent) {
        if self.capacity == 0 {
            return;
        }
        let mut events = self.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Forwards events onto an unbounded channel for an async consumer.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SecurityEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SecurityEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn record(&self, event: SecurityEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("Security event receiver dropped, event discarded");
        }
    }
}

/// Delivers each event to several sinks.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn record(&self, event: SecurityEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.record(event.clone());
            }
            last.record(event);
        }
    }
}
