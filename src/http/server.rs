//! Decision service: the gate exposed over HTTP.
//!
//! # Responsibilities
//! - `POST /v1/admission`: evaluate a JSON request descriptor
//! - `GET /health`: liveness probe
//! - Wire up tracing, request ID and body limit layers
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::gate::{AdmissionGate, Decision, RequestDescriptor};

/// Response body of `POST /v1/admission`.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionResponse {
    #[serde(flatten)]
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limiter_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// HTTP server for the decision service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(gate: Arc<AdmissionGate>) -> Self {
        let body_limit = gate.config().http.max_body_size;
        Self {
            router: Self::build_router(gate, body_limit),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(gate: Arc<AdmissionGate>, body_limit: usize) -> Router {
        Router::new()
            .route("/v1/admission", post(admission_handler))
            .route("/health", get(health_handler))
            .with_state(gate)
            // JSON framing inflates the scanned body, allow headroom.
            .layer(RequestBodyLimitLayer::new(body_limit.saturating_mul(2)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Decision service starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Decision service stopped");
        Ok(())
    }
}

async fn admission_handler(
    State(gate): State<Arc<AdmissionGate>>,
    Json(descriptor): Json<RequestDescriptor>,
) -> Json<AdmissionResponse> {
    let assessment = gate.assess(&descriptor);
    Json(AdmissionResponse {
        decision: assessment.decision,
        limiter_class: assessment.limiter_class,
        retry_after_ms: assessment
            .retry_after
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
    })
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
