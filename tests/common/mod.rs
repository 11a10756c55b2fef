//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use admission_gate::clock::MockClock;
use admission_gate::observability::RecentEvents;
use admission_gate::{AdmissionGate, GateConfig};

pub const ADMIN_KEY: &str = "test-admin-key";

/// A gate wired to an in-memory event buffer and a controllable clock.
pub struct TestGate {
    pub gate: Arc<AdmissionGate>,
    pub events: Arc<RecentEvents>,
    pub clock: MockClock,
}

pub fn test_gate(config: GateConfig) -> TestGate {
    let events = Arc::new(RecentEvents::new(4096));
    let clock = MockClock::default();
    let gate = AdmissionGate::builder(config)
        .sink(events.clone())
        .clock(Arc::new(clock.clone()))
        .build()
        .expect("test config should be valid");

    TestGate {
        gate: Arc::new(gate),
        events,
        clock,
    }
}

/// Config with a single "general" class and the default threat patterns.
pub fn single_class(max_requests: u32, window_ms: u64) -> GateConfig {
    GateConfig::single_class("general", max_requests, window_ms)
}

/// Serve `router` on an ephemeral port and return its address.
pub async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        let _ = axum::serve(listener, app).await;
    });

    addr
}
