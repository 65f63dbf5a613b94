// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Admission decisions for resolved client identities.
//!
//! Per request: ban check, then bucket check, then on denial a violation
//! record that may escalate into a ban. Each step is a separate critical
//! section on its own registry.

use crate::ban::{BanRegistry, Escalation, ViolationTracker};
use crate::bucket::{BucketCheck, TokenBucketRegistry};
use crate::clock::{Clock, SystemClock};
use crate::config::AdmissionConfig;
use crate::metrics::AdmissionMetrics;
use crate::stats::StatsSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Admission decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Request may proceed
    Allowed {
        /// Whole tokens left in the bucket
        remaining: u32,
    },
    /// Bucket is empty
    Denied {
        /// Time until a token is available
        retry_after: Duration,
    },
    /// Identity is banned
    Banned {
        /// Time until the ban expires
        retry_after: Duration,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Retry hint for rejected requests.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Allowed { .. } => None,
            Self::Denied { retry_after } | Self::Banned { retry_after } => Some(*retry_after),
        }
    }

    /// Lower-case name used in metrics and responses.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Allowed { .. } => "allowed",
            Self::Denied { .. } => "denied",
            Self::Banned { .. } => "banned",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allowed { .. } => write!(f, "Allowed"),
            Self::Denied { .. } => write!(f, "Rate limit exceeded"),
            Self::Banned { .. } => {
                write!(f, "IP temporarily banned due to too many violations")
            }
        }
    }
}

/// What a reclaimer pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub bans_removed: usize,
    pub buckets_evicted: usize,
    pub violations_cleared: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.bans_removed == 0 && self.buckets_evicted == 0 && self.violations_cleared == 0
    }
}

/// Thread-safe per-client admission controller.
pub struct AdmissionController {
    config: AdmissionConfig,
    buckets: TokenBucketRegistry,
    escalation: Escalation,
    metrics: Option<AdmissionMetrics>,
}

impl AdmissionController {
    /// Create a controller using the system clock.
    pub fn new(config: AdmissionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a controller with an injected clock.
    pub fn with_clock(config: AdmissionConfig, clock: Arc<dyn Clock>) -> Self {
        let buckets =
            TokenBucketRegistry::new(config.refill_rate, config.burst_capacity, clock.clone());
        let escalation = Escalation::new(
            ViolationTracker::new(config.max_violations),
            BanRegistry::new(clock),
            config.ban_duration(),
        );

        Self {
            config,
            buckets,
            escalation,
            metrics: None,
        }
    }

    /// Record decisions and sweeps into `metrics`.
    pub fn with_metrics(mut self, metrics: AdmissionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Decide whether a request from `identity` may proceed.
    pub async fn check(&self, identity: &str) -> Decision {
        let decision = self.decide(identity).await;
        if let Some(metrics) = &self.metrics {
            metrics.observe_decision(&decision);
        }
        decision
    }

    async fn decide(&self, identity: &str) -> Decision {
        if let Some(retry_after) = self.escalation.bans.remaining(identity).await {
            debug!(identity, ?retry_after, "Identity banned");
            return Decision::Banned { retry_after };
        }

        match self.buckets.check(identity).await {
            BucketCheck::Granted { remaining } => Decision::Allowed { remaining },
            BucketCheck::Exhausted { retry_after } => {
                debug!(identity, ?retry_after, "Rate limit exceeded");
                match self.escalation.record_violation(identity).await {
                    Some(_) => {
                        if let Some(metrics) = &self.metrics {
                            metrics.observe_ban();
                        }
                        Decision::Banned {
                            retry_after: self.escalation.ban_duration(),
                        }
                    }
                    None => Decision::Denied { retry_after },
                }
            }
        }
    }

    /// Whether `identity` is currently banned.
    pub async fn is_banned(&self, identity: &str) -> bool {
        self.escalation.bans.is_banned(identity).await
    }

    /// Record a denial for `identity` outside the normal check path.
    ///
    /// Returns true if this installed a ban.
    pub async fn record_violation(&self, identity: &str) -> bool {
        let banned = self.escalation.record_violation(identity).await.is_some();
        if banned {
            if let Some(metrics) = &self.metrics {
                metrics.observe_ban();
            }
        }
        banned
    }

    /// Current violation count for `identity`.
    pub async fn violations(&self, identity: &str) -> u32 {
        self.escalation.violations.count(identity).await
    }

    /// Current token count for `identity`, if tracked.
    pub async fn tokens(&self, identity: &str) -> Option<f64> {
        self.buckets.tokens(identity).await
    }

    /// One reclaimer pass: expired bans, idle buckets, oversized
    /// violation table. The only place entries are deleted.
    pub async fn sweep(&self) -> SweepReport {
        let report = SweepReport {
            bans_removed: self.escalation.bans.remove_expired().await,
            buckets_evicted: self.buckets.evict_idle(self.config.idle_timeout()).await,
            violations_cleared: self
                .escalation
                .violations
                .compact(self.config.violation_table_limit)
                .await,
        };

        if !report.is_empty() {
            info!(
                bans_removed = report.bans_removed,
                buckets_evicted = report.buckets_evicted,
                violations_cleared = report.violations_cleared,
                "Reclaimed admission state"
            );
        }
        if let Some(metrics) = &self.metrics {
            metrics.observe_sweep(&report);
        }
        report
    }

    /// Read-only snapshot of registry sizes and configuration.
    pub async fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            active_identities: self.buckets.len().await,
            banned_count: self.escalation.bans.len().await,
            tracked_violations: self.escalation.violations.len().await,
            configured_rate: self.config.refill_rate,
            configured_burst: self.config.burst_capacity,
            taken_at: chrono::Utc::now(),
        }
    }

    pub fn metrics(&self) -> Option<&AdmissionMetrics> {
        self.metrics.as_ref()
    }
}
