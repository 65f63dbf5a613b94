// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the admission controller.
//!
//! Default values match the API gateway policy: 20 requests per second
//! sustained, bursts of 30, and a ten minute ban after five consecutive
//! denials.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Slowest accepted refill: one token per ~17 minutes.
pub const MIN_REFILL_RATE: f64 = 0.001;

/// Longest accepted ban or sweep period (one year).
pub const MAX_PERIOD_SECS: u64 = 365 * 24 * 60 * 60;

/// Configuration for the admission controller service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Admission policy
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Per-client admission policy. Static for the lifetime of a controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Sustained requests per second per identity (default: 20)
    #[serde(default = "default_refill_rate")]
    pub refill_rate: f64,

    /// Maximum tokens per bucket (default: 30)
    #[serde(default = "default_burst_capacity")]
    pub burst_capacity: u32,

    /// How long a ban lasts once triggered, in seconds (default: 600)
    #[serde(default = "default_ban_duration_secs")]
    pub ban_duration_secs: u64,

    /// Consecutive denials before a ban is installed (default: 5)
    #[serde(default = "default_max_violations")]
    pub max_violations: u32,

    /// Reclaimer sweep period in seconds (default: 600)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// Buckets untouched for longer than this are evicted (default: 3600)
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Violation table is cleared once it grows past this size (default: 1000)
    #[serde(default = "default_violation_table_limit")]
    pub violation_table_limit: usize,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_refill_rate() -> f64 {
    20.0 // one token every 50ms
}

fn default_burst_capacity() -> u32 {
    30
}

fn default_ban_duration_secs() -> u64 {
    600
}

fn default_max_violations() -> u32 {
    5
}

fn default_cleanup_interval_secs() -> u64 {
    600
}

fn default_idle_timeout_secs() -> u64 {
    3600
}

fn default_violation_table_limit() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            admission: AdmissionConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            refill_rate: default_refill_rate(),
            burst_capacity: default_burst_capacity(),
            ban_duration_secs: default_ban_duration_secs(),
            max_violations: default_max_violations(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            violation_table_limit: default_violation_table_limit(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl AdmissionConfig {
    /// Get the ban duration
    pub fn ban_duration(&self) -> Duration {
        Duration::from_secs(self.ban_duration_secs)
    }

    /// Get the reclaimer sweep period
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Get the bucket idle threshold
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Reject values the controller cannot operate with.
    ///
    /// The controller itself trusts whatever it is given; this is for the
    /// code that builds one from untrusted input.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.refill_rate.is_finite() && self.refill_rate >= MIN_REFILL_RATE) {
            return Err(ConfigError::Invalid(format!(
                "refill_rate must be a finite value of at least {MIN_REFILL_RATE}, got {}",
                self.refill_rate
            )));
        }
        if self.burst_capacity == 0 {
            return Err(ConfigError::Invalid("burst_capacity must be at least 1".into()));
        }
        if self.max_violations == 0 {
            return Err(ConfigError::Invalid("max_violations must be at least 1".into()));
        }
        if self.ban_duration_secs > MAX_PERIOD_SECS {
            return Err(ConfigError::Invalid(format!(
                "ban_duration_secs must be at most {MAX_PERIOD_SECS}, got {}",
                self.ban_duration_secs
            )));
        }
        if self.cleanup_interval_secs == 0 || self.cleanup_interval_secs > MAX_PERIOD_SECS {
            return Err(ConfigError::Invalid(format!(
                "cleanup_interval_secs must be between 1 and {MAX_PERIOD_SECS}, got {}",
                self.cleanup_interval_secs
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }

        let admission = &mut config.admission;
        override_from(&lookup, "REFILL_RATE", &mut admission.refill_rate)?;
        override_from(&lookup, "BURST_CAPACITY", &mut admission.burst_capacity)?;
        override_from(&lookup, "BAN_DURATION_SECS", &mut admission.ban_duration_secs)?;
        override_from(&lookup, "MAX_VIOLATIONS", &mut admission.max_violations)?;
        override_from(
            &lookup,
            "CLEANUP_INTERVAL_SECS",
            &mut admission.cleanup_interval_secs,
        )?;
        override_from(&lookup, "IDLE_TIMEOUT_SECS", &mut admission.idle_timeout_secs)?;
        override_from(
            &lookup,
            "VIOLATION_TABLE_LIMIT",
            &mut admission.violation_table_limit,
        )?;
        override_from(&lookup, "METRICS_ENABLED", &mut config.metrics.enabled)?;

        config.admission.validate()?;
        Ok(config)
    }
}

fn override_from<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *slot = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        })?;
    }
    Ok(())
}
