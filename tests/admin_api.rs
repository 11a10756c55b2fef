//! Admin API over a real listener.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

use admission_gate::admin::{denylist_entry_url, setup_admin_router, AdminState};
use admission_gate::RequestDescriptor;

mod common;

use common::{single_class, spawn_router, test_gate, TestGate, ADMIN_KEY};

async fn start_admin() -> (TestGate, String) {
    let mut config = single_class(10, 60_000);
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    config.denylist.ttl_secs = Some(600);

    let t = test_gate(config);
    let router = setup_admin_router(AdminState {
        gate: t.gate.clone(),
        events: t.events.clone(),
    });
    let addr = spawn_router(router).await;
    (t, format!("http://{}", addr))
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_requires_bearer_key() {
    let (_t, base) = start_admin().await;

    let res = client().get(format!("{}/admin/status", base)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client()
        .get(format!("{}/admin/status", base))
        .bearer_auth("wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_reports_state() {
    let (t, base) = start_admin().await;
    t.gate.evaluate(&RequestDescriptor::new("a", "/"));
    t.gate.evaluate(&RequestDescriptor::new("b", "/"));

    let res = client()
        .get(format!("{}/admin/status", base))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let status: Value = res.json().await.unwrap();
    assert_eq!(status["status"], "operational");
    assert_eq!(status["default_class"], "general");
    assert_eq!(status["tracked_windows"], 2);
    assert_eq!(status["denylist_entries"], 0);
    assert_eq!(status["limiter_classes"]["general"]["max_requests"], 10);
    assert_eq!(status["denylist_ttl_secs"], 600);
}

#[tokio::test]
async fn test_denylist_lifecycle() {
    let (t, base) = start_admin().await;
    let client = client();

    let block = json!({ "identity": "203.0.113.5", "reason": "abuse report" });
    let res = client
        .post(format!("{}/admin/denylist", base))
        .bearer_auth(ADMIN_KEY)
        .json(&block)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/admin/denylist", base))
        .bearer_auth(ADMIN_KEY)
        .json(&block)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let listed: Value = client
        .get(format!("{}/admin/denylist", base))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed[0]["identity"], "203.0.113.5");
    assert_eq!(listed[0]["reason"], "abuse report");
    assert_eq!(listed[0]["expires_in_secs"], 600);

    assert!(!t.gate.evaluate(&RequestDescriptor::new("203.0.113.5", "/")).is_allowed());

    let res = client
        .delete(format!("{}/admin/denylist/203.0.113.5", base))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .delete(format!("{}/admin/denylist/203.0.113.5", base))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert!(t.gate.evaluate(&RequestDescriptor::new("203.0.113.5", "/")).is_allowed());
}

#[tokio::test]
async fn test_clear_and_reset() {
    let (t, base) = start_admin().await;
    let client = client();
    t.gate.denylist_identity("a", "manual");
    t.gate.denylist_identity("b", "manual");
    t.gate.evaluate(&RequestDescriptor::new("c", "/"));

    let cleared: Value = client
        .delete(format!("{}/admin/denylist", base))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["removed"], 2);
    assert!(t.gate.state().denylist.is_empty());

    let res = client
        .post(format!("{}/admin/reset", base))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(t.gate.state().limiter.is_empty());
    assert!(t.events.is_empty());
}

#[tokio::test]
async fn test_events_endpoint() {
    let (t, base) = start_admin().await;
    t.gate.evaluate(&RequestDescriptor::new("a", "/?q=<script>alert(1)</script>"));

    let events: Value = client()
        .get(format!("{}/admin/events", base))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["kind"], "suspicious_pattern");
    assert_eq!(events[0]["severity"], "critical");
    assert_eq!(events[0]["identity"], "a");
}

#[tokio::test]
async fn test_clear_identity_with_reserved_characters() {
    let (t, base) = start_admin().await;
    let client = client();
    for identity in ["a", "a?x", "a#b", "10.0.0.0/8"] {
        t.gate.denylist_identity(identity, "manual");
    }

    for identity in ["a?x", "a#b", "10.0.0.0/8"] {
        let res = client
            .delete(denylist_entry_url(&base, identity).unwrap())
            .bearer_auth(ADMIN_KEY)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT, "clearing {}", identity);
    }

    let remaining: Vec<String> = t
        .gate
        .state()
        .denylist
        .snapshot()
        .into_iter()
        .map(|(identity, _)| identity)
        .collect();
    assert_eq!(remaining, vec!["a".to_string()]);
}
