// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Read-only view of controller state.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point-in-time counts of the controller's registries.
///
/// Each count is read under its own lock, so under concurrent writers the
/// fields may reflect slightly different instants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Identities holding a token bucket
    pub active_identities: usize,
    /// Ban entries, including expired ones not yet reclaimed
    pub banned_count: usize,
    /// Identities with a violation counter entry
    pub tracked_violations: usize,
    /// Configured refill rate (tokens per second)
    pub configured_rate: f64,
    /// Configured burst capacity
    pub configured_burst: u32,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}
