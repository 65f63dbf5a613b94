// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-identity token buckets with continuous refill.
//!
//! The map is guarded by an `RwLock` and only taken for writing when an
//! identity is seen for the first time or during a sweep. Each bucket has
//! its own mutex, so refill and consumption for one identity are atomic
//! without blocking other identities.

use crate::clock::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Outcome of a bucket check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BucketCheck {
    /// A token was consumed
    Granted {
        /// Whole tokens left after consumption
        remaining: u32,
    },
    /// No token available; nothing was consumed
    Exhausted {
        /// Time until one token is available
        retry_after: Duration,
    },
}

/// Token bucket for one identity.
#[derive(Debug)]
struct TokenBucket {
    /// Available tokens, always within `[0, max_tokens]`
    tokens: f64,
    /// Maximum tokens (bucket capacity)
    max_tokens: f64,
    /// Token refill rate per second
    refill_rate: f64,
    /// Last time tokens were refilled
    last_refill: Instant,
    /// Last time a request touched this bucket
    last_access: Instant,
}

impl TokenBucket {
    fn new(max_tokens: f64, refill_rate: f64, now: Instant) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate,
            last_refill: now,
            last_access: now,
        }
    }

    /// Tokens the bucket would hold at `now`, without mutating it.
    fn projected(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        (self.tokens + elapsed * self.refill_rate).min(self.max_tokens)
    }

    /// Refill tokens based on elapsed time.
    fn refill(&mut self, now: Instant) {
        self.tokens = self.projected(now);
        if now > self.last_refill {
            self.last_refill = now;
        }
    }

    /// Try to consume a token.
    fn try_consume(&mut self, now: Instant) -> BucketCheck {
        self.refill(now);
        self.last_access = self.last_access.max(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            BucketCheck::Granted {
                remaining: self.tokens.floor() as u32,
            }
        } else {
            BucketCheck::Exhausted {
                retry_after: self.time_until_available(),
            }
        }
    }

    /// Get time until a token is available.
    fn time_until_available(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else if self.refill_rate > 0.0 {
            Duration::try_from_secs_f64((1.0 - self.tokens) / self.refill_rate)
                .unwrap_or(Duration::MAX)
        } else {
            Duration::MAX
        }
    }
}

/// Registry holding one bucket per identity.
pub struct TokenBucketRegistry {
    capacity: f64,
    refill_rate: f64,
    clock: Arc<dyn Clock>,
    buckets: RwLock<HashMap<String, Arc<Mutex<TokenBucket>>>>,
}

impl TokenBucketRegistry {
    /// Create a registry. Rate and capacity are not validated.
    pub fn new(refill_rate: f64, burst_capacity: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            capacity: f64::from(burst_capacity),
            refill_rate,
            clock,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Refill and try to consume one token for `identity`.
    ///
    /// A bucket is created full on first reference.
    pub async fn check(&self, identity: &str) -> BucketCheck {
        loop {
            let bucket = self.bucket_for(identity).await;
            if let Some(outcome) = self.consume_from(identity, &bucket).await {
                return outcome;
            }
        }
    }

    /// Consume from `bucket` unless a sweep detached it from the map
    /// before the lock was taken.
    async fn consume_from(
        &self,
        identity: &str,
        bucket: &Arc<Mutex<TokenBucket>>,
    ) -> Option<BucketCheck> {
        let mut guard = bucket.lock().await;

        // A locked bucket is never evicted, so once it is found in the map
        // it stays there until the guard drops.
        let attached = self
            .buckets
            .read()
            .await
            .get(identity)
            .is_some_and(|current| Arc::ptr_eq(current, bucket));
        if !attached {
            return None;
        }

        // Read the clock under the bucket lock so racing callers observe
        // non-decreasing instants.
        let now = self.clock.now();
        Some(guard.try_consume(now))
    }

    /// Boolean form of [`check`](Self::check).
    pub async fn allow(&self, identity: &str) -> bool {
        matches!(self.check(identity).await, BucketCheck::Granted { .. })
    }

    async fn bucket_for(&self, identity: &str) -> Arc<Mutex<TokenBucket>> {
        {
            let buckets = self.buckets.read().await;
            if let Some(bucket) = buckets.get(identity) {
                return bucket.clone();
            }
        }

        let mut buckets = self.buckets.write().await;
        buckets
            .entry(identity.to_string())
            .or_insert_with(|| {
                debug!(identity, "Tracking new identity");
                Arc::new(Mutex::new(TokenBucket::new(
                    self.capacity,
                    self.refill_rate,
                    self.clock.now(),
                )))
            })
            .clone()
    }

    /// Current token count for `identity` including passive refill.
    pub async fn tokens(&self, identity: &str) -> Option<f64> {
        let bucket = self.buckets.read().await.get(identity).cloned()?;
        let bucket = bucket.lock().await;
        Some(bucket.projected(self.clock.now()))
    }

    /// Number of tracked identities.
    pub async fn len(&self) -> usize {
        self.buckets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.buckets.read().await.is_empty()
    }

    /// Drop buckets whose last access is at least `idle_timeout` ago.
    ///
    /// Buckets locked by an in-flight request are kept.
    pub async fn evict_idle(&self, idle_timeout: Duration) -> usize {
        let now = self.clock.now();
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();

        buckets.retain(|_, bucket| match bucket.try_lock() {
            Ok(bucket) => now.saturating_duration_since(bucket.last_access) < idle_timeout,
            Err(_) => true,
        });

        before - buckets.len()
    }
}
