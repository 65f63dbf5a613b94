// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Admission Controller
//!
//! Per-client admission control for the bastion HTTP services:
//!
//! - Client identity from `X-Forwarded-For`, `X-Real-IP` or the peer address
//! - Token bucket per identity (20 rps sustained, burst of 30 by default)
//! - Temporary bans after repeated denials (5 denials, 10 minutes)
//! - Background reclaimer for expired bans and idle buckets
//! - Stats snapshot and Prometheus counters

pub mod ban;
pub mod bucket;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod reclaimer;
pub mod stats;

pub use config::{AdmissionConfig, Config};
pub use controller::{AdmissionController, Decision, SweepReport};
pub use reclaimer::{Reclaimer, ReclaimerHandle};
pub use stats::StatsSnapshot;
