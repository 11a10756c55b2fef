//! Axum middleware that runs the admission gate in front of a router.
//!
//! # Responsibilities
//! - Derive the caller identity (identity header, else peer address)
//! - Pick the limiter class from the request path
//! - Buffer the body so it can be scanned, then hand it on untouched
//! - Translate `Deny` into an HTTP response
//!
//! # Design Decisions
//! - Settings are read from the gate's live config on every request, so a
//!   hot reload also changes identity header, body limit and class routes
//! - Bodies are decoded lossily: binary uploads are still scanned for ASCII
//!   indicators instead of being rejected outright

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::schema::{ClassRouteConfig, HttpConfig};
use crate::gate::{AdmissionGate, Decision, DenyReason, RequestBody, RequestDescriptor};

/// Gate every request passing through this layer.
///
/// ```ignore
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(axum::middleware::from_fn_with_state(gate.clone(), admission_middleware));
/// ```
pub async fn admission_middleware(
    State(gate): State<Arc<AdmissionGate>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = gate.config();
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, config.http.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                peer = %peer,
                limit = config.http.max_body_size,
                error = %e,
                "Request body rejected before admission"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let identity = client_identity(&parts.headers, &config.http.identity_header, peer);
    let descriptor = describe_request(identity, &parts, &bytes, &config.http);
    let assessment = gate.assess(&descriptor);

    match assessment.decision {
        Decision::Allow => next.run(Request::from_parts(parts, Body::from(bytes))).await,
        Decision::Deny { reason, message } => deny_response(reason, message, assessment.retry_after),
    }
}

/// Identity from the first entry of `identity_header`, else the peer IP.
pub fn client_identity(headers: &HeaderMap, identity_header: &str, peer: SocketAddr) -> String {
    headers
        .get(identity_header)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}

/// Limiter class of the longest matching route prefix.
pub fn class_for_path(path: &str, routes: &[ClassRouteConfig]) -> Option<String> {
    routes
        .iter()
        .filter(|route| path.starts_with(&route.path_prefix))
        .max_by_key(|route| route.path_prefix.len())
        .map(|route| route.class.clone())
}

/// Build the gate's view of an HTTP request.
pub fn describe_request(identity: String, parts: &Parts, body: &[u8], http: &HttpConfig) -> RequestDescriptor {
    let url = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();

    let headers = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let body = if body.is_empty() {
        None
    } else {
        Some(RequestBody::Text(String::from_utf8_lossy(body).into_owned()))
    };

    RequestDescriptor {
        identity,
        url,
        headers,
        body,
        limiter_class: class_for_path(parts.uri.path(), &http.class_routes),
    }
}

/// HTTP status for each denial reason.
pub fn status_for(reason: DenyReason) -> StatusCode {
    match reason {
        DenyReason::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        DenyReason::ThreatDetected => StatusCode::BAD_REQUEST,
        DenyReason::DenylistedIdentity => StatusCode::FORBIDDEN,
        DenyReason::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn deny_response(reason: DenyReason, message: String, retry_after: Option<Duration>) -> Response {
    let mut response = (status_for(reason), message).into_response();
    if let Some(retry_after) = retry_after {
        // Round up so clients never retry inside the window.
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    }
    response
}
