//! Admission gate decision service.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /v1/admission ──▶ http::server ──▶ AdmissionGate::assess ──▶ JSON decision
//!                                                   │
//!                        ┌──────────────────────────┼──────────────────────────┐
//!                        ▼                          ▼                          ▼
//!                  security::denylist      security::rate_limit       security::threat
//!
//!     Background tasks: config watcher (hot reload), sweeper, admin API, metrics exporter
//!     Ctrl+C ──▶ Shutdown broadcast ──▶ every task drains and exits
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use admission_gate::admin::{setup_admin_router, AdminState};
use admission_gate::config::{load_config, watcher::ConfigWatcher, GateConfig};
use admission_gate::lifecycle::{Shutdown, Sweeper};
use admission_gate::observability::{logging, metrics, FanoutSink, RecentEvents, TracingSink};
use admission_gate::{AdmissionGate, HttpServer};

#[derive(Parser)]
#[command(name = "admission-gate", version, about = "Request admission gate decision service")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "gate.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config_present = args.config.exists();
    let config = if config_present {
        load_config(&args.config)?
    } else {
        GateConfig::default()
    };

    logging::init_logging(&config.observability)?;
    tracing::info!("admission-gate v{} starting", env!("CARGO_PKG_VERSION"));
    if !config_present {
        tracing::warn!(path = %args.config.display(), "Config file not found, using built-in defaults");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let recent = Arc::new(RecentEvents::new(config.events.recent_capacity));
    let sink = FanoutSink::new()
        .with(Arc::new(TracingSink))
        .with(recent.clone());
    let gate = Arc::new(AdmissionGate::builder(config.clone()).sink(Arc::new(sink)).build()?);

    tracing::info!(
        default_class = %config.default_class,
        classes = config.limiter_classes.len(),
        pattern_groups = config.threats.groups.len(),
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();

    // Gauges are published on the same interval even when eviction is off.
    let sweeper = Sweeper::new(
        gate.state().clone(),
        gate.clock().clone(),
        Duration::from_secs(config.sweeper.interval_secs.max(1)),
    );
    let sweeper = if config.sweeper.enabled {
        sweeper
    } else {
        sweeper.report_only()
    };
    tokio::spawn(sweeper.run(shutdown.subscribe()));
    gate.publish_state_size();

    // Dropping the watcher stops file notifications; keep it alive until exit.
    let _watcher = if config_present {
        let (watcher, mut updates) = ConfigWatcher::new(&args.config);
        let handle = watcher.run()?;
        let gate = gate.clone();
        let mut stop = shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(new_config) = updates.recv() => {
                        if let Err(e) = gate.reconfigure(new_config) {
                            tracing::error!(error = %e, "Reloaded config rejected by gate");
                        }
                    }
                    _ = stop.recv() => break,
                }
            }
        });
        Some(handle)
    } else {
        None
    };

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let router = setup_admin_router(AdminState {
            gate: gate.clone(),
            events: recent.clone(),
        });
        let stop = shutdown.clone();
        tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { stop.wait().await })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
            }
            shutdown.trigger();
        }
    });

    let listener = TcpListener::bind(&config.http.bind_address).await?;
    HttpServer::new(gate).run(listener, shutdown.subscribe()).await?;

    shutdown.trigger();
    tracing::info!("Shutdown complete");
    Ok(())
}
