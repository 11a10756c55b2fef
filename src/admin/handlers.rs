use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::AdminState;
use crate::config::schema::LimiterClassConfig;
use crate::observability::event::SecurityEvent;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub default_class: String,
    pub limiter_classes: BTreeMap<String, LimiterClassConfig>,
    pub pattern_groups: Vec<String>,
    pub threats_enabled: bool,
    pub tracked_windows: usize,
    pub denylist_entries: usize,
    pub denylist_ttl_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DenylistView {
    pub identity: String,
    pub reason: String,
    pub age_secs: u64,
    /// `None` for entries that never expire.
    pub expires_in_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    pub identity: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockResponse {
    pub identity: String,
    pub added: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub removed: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let config = state.gate.config();
    let gate_state = state.gate.state();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        default_class: config.default_class.clone(),
        limiter_classes: config.limiter_classes.clone(),
        pattern_groups: config.threats.groups.iter().map(|g| g.name.clone()).collect(),
        threats_enabled: config.threats.enabled,
        tracked_windows: gate_state.limiter.len(),
        denylist_entries: gate_state.denylist.len(),
        denylist_ttl_secs: config.denylist.ttl_secs,
    })
}

pub async fn get_denylist(State(state): State<AdminState>) -> Json<Vec<DenylistView>> {
    let now = state.gate.clock().now();
    let entries = state
        .gate
        .state()
        .denylist
        .snapshot()
        .into_iter()
        .filter(|(_, entry)| !entry.is_expired(now))
        .map(|(identity, entry)| DenylistView {
            identity,
            reason: entry.reason,
            age_secs: now.saturating_duration_since(entry.added_at).as_secs(),
            expires_in_secs: entry
                .expires_at
                .map(|at| at.saturating_duration_since(now).as_secs()),
        })
        .collect();

    Json(entries)
}

pub async fn add_denylist(
    State(state): State<AdminState>,
    Json(request): Json<BlockRequest>,
) -> Result<(StatusCode, Json<BlockResponse>), StatusCode> {
    let identity = request.identity.trim();
    if identity.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let reason = request.reason.as_deref().unwrap_or("manual");
    let added = state.gate.denylist_identity(identity, reason);
    let status = if added { StatusCode::CREATED } else { StatusCode::OK };

    Ok((
        status,
        Json(BlockResponse {
            identity: identity.to_string(),
            added,
        }),
    ))
}

pub async fn remove_denylist_entry(
    State(state): State<AdminState>,
    Path(identity): Path<String>,
) -> StatusCode {
    if state.gate.clear_denylisted(&identity) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn clear_denylist(State(state): State<AdminState>) -> Json<ClearResponse> {
    Json(ClearResponse {
        removed: state.gate.clear_denylist(),
    })
}

pub async fn reset_state(State(state): State<AdminState>) -> StatusCode {
    state.gate.reset();
    state.events.clear();
    StatusCode::NO_CONTENT
}

pub async fn get_events(State(state): State<AdminState>) -> Json<Vec<SecurityEvent>> {
    Json(state.events.snapshot())
}
