// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Background sweep bounding the memory held per identity.

use crate::controller::AdmissionController;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Spawns the periodic sweep.
pub struct Reclaimer;

/// Handle to a running reclaimer task.
pub struct ReclaimerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Reclaimer {
    /// Sweep `controller` every `interval`, first run one interval from now.
    pub fn spawn(controller: Arc<AdmissionController>, interval: Duration) -> ReclaimerHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            info!(interval_secs = interval.as_secs(), "Reclaimer started");

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let report = controller.sweep().await;
                        debug!(?report, "Reclaimer sweep finished");
                    }
                }
            }

            info!("Reclaimer stopped");
        });

        ReclaimerHandle { token, task }
    }
}

impl ReclaimerHandle {
    /// Token that stops the task when cancelled.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Reclaimer task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::AdmissionConfig;

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_on_interval_and_stops() {
        let clock = Arc::new(ManualClock::new());
        let config = AdmissionConfig {
            burst_capacity: 1,
            max_violations: 1,
            ban_duration_secs: 5,
            ..Default::default()
        };
        let controller = Arc::new(AdmissionController::with_clock(config, clock.clone()));

        controller.check("a").await;
        controller.check("a").await;
        assert_eq!(controller.snapshot().await.banned_count, 1);

        let handle = Reclaimer::spawn(controller.clone(), Duration::from_secs(60));
        clock.advance(Duration::from_secs(5));

        // Before the first tick nothing is swept
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(controller.snapshot().await.banned_count, 1);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(controller.snapshot().await.banned_count, 0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_is_prompt() {
        let controller = Arc::new(AdmissionController::new(AdmissionConfig::default()));
        let handle = Reclaimer::spawn(controller, Duration::from_secs(3600));
        let token = handle.token();

        tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .expect("reclaimer should stop promptly");
        assert!(token.is_cancelled());
    }
}
