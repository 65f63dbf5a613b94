// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for admission decisions and reclamation.

use crate::controller::{Decision, SweepReport};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters exported on the metrics endpoint.
#[derive(Clone)]
pub struct AdmissionMetrics {
    registry: Registry,
    decisions: IntCounterVec,
    bans_installed: IntCounter,
    reclaimed: IntCounterVec,
}

impl AdmissionMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let decisions = IntCounterVec::new(
            Opts::new("admission_decisions_total", "Admission decisions by outcome"),
            &["decision"],
        )?;
        let bans_installed = IntCounter::new(
            "admission_bans_installed_total",
            "Bans installed after repeated violations",
        )?;
        let reclaimed = IntCounterVec::new(
            Opts::new("admission_reclaimed_total", "Entries removed by the reclaimer"),
            &["kind"],
        )?;

        registry.register(Box::new(decisions.clone()))?;
        registry.register(Box::new(bans_installed.clone()))?;
        registry.register(Box::new(reclaimed.clone()))?;

        Ok(Self {
            registry,
            decisions,
            bans_installed,
            reclaimed,
        })
    }

    pub fn observe_decision(&self, decision: &Decision) {
        self.decisions.with_label_values(&[decision.label()]).inc();
    }

    pub fn observe_ban(&self) {
        self.bans_installed.inc();
    }

    pub fn observe_sweep(&self, report: &SweepReport) {
        self.reclaimed
            .with_label_values(&["bans"])
            .inc_by(report.bans_removed as u64);
        self.reclaimed
            .with_label_values(&["buckets"])
            .inc_by(report.buckets_evicted as u64);
        self.reclaimed
            .with_label_values(&["violations"])
            .inc_by(report.violations_cleared as u64);
    }

    /// Render all counters in the text exposition format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_render_contains_counters() {
        let metrics = AdmissionMetrics::new().unwrap();
        metrics.observe_decision(&Decision::Allowed { remaining: 3 });
        metrics.observe_decision(&Decision::Banned {
            retry_after: Duration::from_secs(5),
        });
        metrics.observe_ban();

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"admission_decisions_total{decision="allowed"} 1"#));
        assert!(text.contains(r#"admission_decisions_total{decision="banned"} 1"#));
        assert!(text.contains("admission_bans_installed_total 1"));
    }
}
