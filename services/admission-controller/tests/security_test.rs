// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Security tests for the admission controller.
//!
//! These tests replay flood patterns in simulated time and check that
//! abusive clients are throttled and banned while well-behaved ones pass.

mod harness;

use admission_controller::{
    clock::ManualClock,
    config::AdmissionConfig,
    controller::{AdmissionController, Decision},
    identity::{resolve, TransportMeta},
};
use harness::{
    attacks::AttackConfig,
    generators,
    metrics::{AttackMetrics, Outcome},
};
use std::sync::Arc;

/// Run a flood simulation against a fresh controller.
async fn run_attack(config: &AttackConfig, admission: AdmissionConfig) -> AttackMetrics {
    let clock = Arc::new(ManualClock::new());
    let controller = AdmissionController::with_clock(admission, clock.clone());

    let ips = generators::generate_ips(config.unique_ips);
    let delay = config.delay();
    let mut metrics = AttackMetrics::new();

    for i in 0..config.total_requests {
        let ip = ips[i % ips.len()];
        let chain = generators::forwarded_chain(ip, config.proxy_hops);
        let port = 40000 + i % 1000;
        let remote = if config.proxy_hops > 0 {
            format!("172.16.0.254:{port}")
        } else {
            format!("{ip}:{port}")
        };

        let identity = resolve(&TransportMeta {
            forwarded_for: (config.proxy_hops > 0).then_some(chain.as_str()),
            real_ip: None,
            remote_addr: &remote,
        });

        let outcome = match controller.check(&identity).await {
            Decision::Allowed { .. } => Outcome::Allowed,
            Decision::Denied { .. } => Outcome::Denied,
            Decision::Banned { .. } => Outcome::Banned,
        };
        metrics.record(i, outcome, &identity);

        clock.advance(delay);
    }

    metrics
}

#[tokio::test]
async fn test_single_ip_flood() {
    let config = AttackConfig::single_ip_flood();
    let metrics = run_attack(&config, AdmissionConfig::default()).await;
    println!("{}", metrics);

    assert!(
        metrics.block_rate() >= 0.9,
        "Block rate {} should be >= 90% for single IP flood",
        metrics.block_rate()
    );
    assert!(metrics.count(Outcome::Allowed) <= 40);
    assert_eq!(metrics.count(Outcome::Denied), 4);

    // Once banned, nothing else gets through for the rest of the flood
    let first_ban = metrics.first_ban().expect("flood should trigger a ban");
    assert_eq!(metrics.count(Outcome::Banned), config.total_requests - first_ban);
}

#[tokio::test]
async fn test_distributed_low_rate_clients_pass() {
    let config = AttackConfig::distributed_attack();
    let metrics = run_attack(&config, AdmissionConfig::default()).await;
    println!("{}", metrics);

    // Each IP stays under the sustained rate
    assert_eq!(metrics.unique_identities(), 100);
    assert_eq!(metrics.count(Outcome::Allowed), config.total_requests);
    assert_eq!(metrics.count(Outcome::Banned), 0);
}

#[tokio::test]
async fn test_proxied_flood_is_attributed_to_client() {
    let config = AttackConfig::proxied_flood();
    let metrics = run_attack(&config, AdmissionConfig::default()).await;
    println!("{}", metrics);

    // Rotating proxy ports must not split the client into many identities
    assert_eq!(metrics.unique_identities(), 1);
    assert!(metrics.count(Outcome::Banned) > 0);
}
