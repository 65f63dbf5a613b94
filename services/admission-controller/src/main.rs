// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Admission Controller Service
//!
//! Per-client rate limiting with escalating temporary bans. Each client
//! identity gets a token bucket; repeated denials ban the identity for a
//! while.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `REFILL_RATE`: Sustained requests per second per identity (default: 20)
//! - `BURST_CAPACITY`: Bucket capacity (default: 30)
//! - `BAN_DURATION_SECS`: Ban length (default: 600)
//! - `MAX_VIOLATIONS`: Denials before a ban (default: 5)
//! - `CLEANUP_INTERVAL_SECS`: Reclaimer period (default: 600)
//! - `IDLE_TIMEOUT_SECS`: Bucket idle eviction threshold (default: 3600)
//! - `VIOLATION_TABLE_LIMIT`: Violation table compaction size (default: 1000)
//! - `METRICS_ENABLED`: Expose Prometheus metrics (default: true)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use admission_controller::{
    config::Config,
    controller::AdmissionController,
    handlers::{router, AppState},
    metrics::AdmissionMetrics,
    reclaimer::Reclaimer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        refill_rate = config.admission.refill_rate,
        burst_capacity = config.admission.burst_capacity,
        max_violations = config.admission.max_violations,
        ban_duration_secs = config.admission.ban_duration_secs,
        "Starting admission controller"
    );

    // Create application state
    let mut controller = AdmissionController::new(config.admission.clone());
    if config.metrics.enabled {
        controller = controller.with_metrics(AdmissionMetrics::new()?);
    }
    let controller = Arc::new(controller);

    let reclaimer = Reclaimer::spawn(controller.clone(), config.admission.cleanup_interval());

    let state = Arc::new(AppState {
        controller,
        config: config.clone(),
    });
    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    reclaimer.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
