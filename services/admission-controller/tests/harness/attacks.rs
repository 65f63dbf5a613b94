// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Flood patterns for security testing.

use std::time::Duration;

/// Flood pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Requests per second rate, in simulated time
    pub requests_per_second: f64,
    /// Number of unique IPs to simulate
    pub unique_ips: usize,
    /// Proxy hops appended after the client address
    pub proxy_hops: usize,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            requests_per_second: 10.0,
            unique_ips: 1,
            proxy_hops: 0,
        }
    }
}

/// Predefined flood patterns.
impl AttackConfig {
    /// Single IP flood far above the sustained rate.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 500,
            requests_per_second: 200.0,
            unique_ips: 1,
            ..Default::default()
        }
    }

    /// Many IPs, each below the sustained rate.
    pub fn distributed_attack() -> Self {
        Self {
            total_requests: 2000,
            requests_per_second: 400.0,
            unique_ips: 100,
            ..Default::default()
        }
    }

    /// Single client hidden behind a proxy chain.
    pub fn proxied_flood() -> Self {
        Self {
            total_requests: 300,
            requests_per_second: 200.0,
            unique_ips: 1,
            proxy_hops: 3,
        }
    }

    /// Simulated gap between consecutive requests.
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.requests_per_second)
    }
}
