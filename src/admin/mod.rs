//! Operator API for inspecting and steering a running gate.
//!
//! Every route sits behind bearer-token auth (`admin.api_key`).

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use url::Url;

use crate::gate::AdmissionGate;
use crate::observability::sink::RecentEvents;

use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub gate: Arc<AdmissionGate>,
    pub events: Arc<RecentEvents>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route(
            "/admin/denylist",
            get(get_denylist).post(add_denylist).delete(clear_denylist),
        )
        .route("/admin/denylist/{identity}", delete(remove_denylist_entry))
        .route("/admin/reset", post(reset_state))
        .route("/admin/events", get(get_events))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// URL of one denylist entry under the admin API at `base`.
///
/// The identity is pushed as a single escaped path segment, so reserved
/// characters (`/`, `?`, `#`, `%`) stay part of the identity.
pub fn denylist_entry_url(base: &str, identity: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(["admin", "denylist", identity]);
    Ok(url)
}
