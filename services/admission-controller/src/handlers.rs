// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP surface for the admission controller.
//!
//! The controller can be used two ways: as an external check service
//! (`POST /check`) called by a proxy, or as a middleware layer in front of
//! the host's own routes.
//!
//! The stats and metrics routes sit behind the middleware themselves.
//! The health routes and `/check` do not: the caller of `/check` is the proxy,
//! not the client being admitted.

use crate::config::Config;
use crate::controller::{AdmissionController, Decision};
use crate::identity::{self, TransportMeta};
use crate::stats::StatsSnapshot;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    pub controller: Arc<AdmissionController>,
    pub config: Config,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Envelope for the stats endpoint.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub code: u16,
    pub message: &'static str,
    pub data: StatsSnapshot,
}

/// Admission check request (for external validation).
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub forwarded_for: Option<String>,
    #[serde(default)]
    pub real_ip: Option<String>,
    #[serde(default)]
    pub remote_addr: String,
}

/// Admission check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub identity: String,
    pub allowed: bool,
    pub decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut operational = Router::new().route("/api/system/rate-limit-stats", get(stats));
    if state.config.metrics.enabled {
        operational = operational.route(&state.config.metrics.path, get(metrics));
    }
    let operational = operational.route_layer(middleware::from_fn_with_state(
        state.clone(),
        admission_middleware,
    ));

    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/check", post(check))
        .merge(operational)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "admission-controller",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Current registry sizes and configuration.
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        code: 200,
        message: "Rate limit stats",
        data: state.controller.snapshot().await,
    })
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let Some(metrics) = state.controller.metrics() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Resolve an identity from the supplied metadata and decide admission.
///
/// Always answers 200 so the calling proxy can read the body.
pub async fn check(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckRequest>,
) -> Json<CheckResponse> {
    let identity = identity::resolve(&TransportMeta {
        forwarded_for: req.forwarded_for.as_deref(),
        real_ip: req.real_ip.as_deref(),
        remote_addr: &req.remote_addr,
    });

    let decision = state.controller.check(&identity).await;
    debug!(identity = %identity, decision = decision.label(), "Processed admission check");

    Json(CheckResponse {
        allowed: decision.is_allowed(),
        decision: decision.label(),
        reason: (!decision.is_allowed()).then(|| decision.to_string()),
        retry_after_secs: decision.retry_after().map(retry_secs),
        remaining: match decision {
            Decision::Allowed { remaining } => Some(remaining),
            _ => None,
        },
        identity,
    })
}

/// Middleware rejecting requests before they reach any handler.
///
/// Install with `axum::middleware::from_fn_with_state`.
pub async fn admission_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = identity::resolve_headers(request.headers(), remote);

    let decision = state.controller.check(&identity).await;
    let code = match decision {
        Decision::Allowed { .. } => return next.run(request).await,
        Decision::Denied { .. } => "RATE_LIMITED",
        Decision::Banned { .. } => "BANNED",
    };

    let retry_after = decision.retry_after().map(retry_secs).unwrap_or(1);
    info!(identity = %identity, code, retry_after_secs = retry_after, "Request rejected");

    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after.to_string())],
        Json(ErrorResponse {
            error: decision.to_string(),
            code,
            retry_after_secs: Some(retry_after),
        }),
    )
        .into_response()
}

/// Whole seconds, rounded up so clients never retry early.
fn retry_secs(d: std::time::Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_retry_secs_rounds_up() {
        assert_eq!(retry_secs(Duration::ZERO), 0);
        assert_eq!(retry_secs(Duration::from_millis(50)), 1);
        assert_eq!(retry_secs(Duration::from_secs(600)), 600);
        assert_eq!(retry_secs(Duration::from_millis(1500)), 2);
    }
}
