// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Violation counting and temporary bans.
//!
//! Violations are cumulative: a successful request does not reset the
//! counter, only the installation of a ban does.

use crate::clock::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Active bans keyed by identity.
pub struct BanRegistry {
    clock: Arc<dyn Clock>,
    bans: RwLock<HashMap<String, Instant>>,
}

impl BanRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            bans: RwLock::new(HashMap::new()),
        }
    }

    /// Whether `identity` is banned right now.
    ///
    /// Expiry is decided by timestamp; an expired entry stays in the map
    /// until the next sweep.
    pub async fn is_banned(&self, identity: &str) -> bool {
        self.remaining(identity).await.is_some()
    }

    /// Time left on an active ban, if any.
    pub async fn remaining(&self, identity: &str) -> Option<Duration> {
        let now = self.clock.now();
        let bans = self.bans.read().await;
        let expires_at = *bans.get(identity)?;
        (now < expires_at).then(|| expires_at - now)
    }

    /// Ban `identity` for `duration` from now. Returns the expiry instant.
    ///
    /// Durations past what `Instant` can represent are clamped to a
    /// hundred years.
    pub async fn install(&self, identity: &str, duration: Duration) -> Instant {
        let now = self.clock.now();
        let expires_at = now
            .checked_add(duration)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        self.bans
            .write()
            .await
            .insert(identity.to_string(), expires_at);
        expires_at
    }

    /// Remove every ban whose expiry has passed.
    pub async fn remove_expired(&self) -> usize {
        let now = self.clock.now();
        let mut bans = self.bans.write().await;
        let before = bans.len();
        bans.retain(|_, expires_at| now < *expires_at);
        before - bans.len()
    }

    /// Number of ban entries, expired or not.
    pub async fn len(&self) -> usize {
        self.bans.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bans.read().await.is_empty()
    }
}

/// Result of recording a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Counter incremented, threshold not reached
    Counted(u32),
    /// Threshold reached; counter reset and a ban is due
    ThresholdReached,
}

/// Consecutive-denial counters keyed by identity.
pub struct ViolationTracker {
    max_violations: u32,
    counts: RwLock<HashMap<String, u32>>,
}

impl ViolationTracker {
    pub fn new(max_violations: u32) -> Self {
        Self {
            max_violations,
            counts: RwLock::new(HashMap::new()),
        }
    }

    /// Increment the counter for `identity`, resetting it at the threshold.
    pub async fn increment(&self, identity: &str) -> Violation {
        let mut counts = self.counts.write().await;
        let count = counts.entry(identity.to_string()).or_insert(0);
        *count = count.saturating_add(1);

        if *count >= self.max_violations {
            *count = 0;
            Violation::ThresholdReached
        } else {
            Violation::Counted(*count)
        }
    }

    /// Current counter for `identity`.
    pub async fn count(&self, identity: &str) -> u32 {
        self.counts.read().await.get(identity).copied().unwrap_or(0)
    }

    /// Clear the whole table if it holds more than `limit` entries.
    pub async fn compact(&self, limit: usize) -> usize {
        let mut counts = self.counts.write().await;
        if counts.len() > limit {
            let cleared = counts.len();
            counts.clear();
            cleared
        } else {
            0
        }
    }

    pub async fn len(&self) -> usize {
        self.counts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.counts.read().await.is_empty()
    }
}

/// Records violations and installs bans when the threshold is crossed.
///
/// The violation lock is released before the ban lock is taken.
pub struct Escalation {
    pub violations: ViolationTracker,
    pub bans: BanRegistry,
    ban_duration: Duration,
}

impl Escalation {
    pub fn new(violations: ViolationTracker, bans: BanRegistry, ban_duration: Duration) -> Self {
        Self {
            violations,
            bans,
            ban_duration,
        }
    }

    /// Record one denial. Returns the ban expiry if one was installed.
    pub async fn record_violation(&self, identity: &str) -> Option<Instant> {
        match self.violations.increment(identity).await {
            Violation::Counted(_) => None,
            Violation::ThresholdReached => {
                let expires_at = self.bans.install(identity, self.ban_duration).await;
                warn!(
                    identity,
                    ban_secs = self.ban_duration.as_secs(),
                    "Violation threshold reached, identity banned"
                );
                Some(expires_at)
            }
        }
    }

    pub fn ban_duration(&self) -> Duration {
        self.ban_duration
    }
}
