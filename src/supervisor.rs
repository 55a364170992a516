use std::sync::Arc;
use std::time::{Duration, Instant};

use sysinfo::System;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::clock::TimeSource;
use crate::config::SupervisorConfig;
use crate::display::DisplayRenderer;
use crate::errors::FatalCondition;
use crate::link::NetworkLink;
use crate::retry::RetryPolicy;
use crate::watchdog::Heartbeat;

/// Link recovery progress. `Recovering(n)` counts consecutive failed
/// reconnect attempts; reaching the configured maximum is the designed
/// fatal path, resolved only by a full restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Up,
    Recovering(u32),
}

/// Keeps connectivity and time alive without blocking the main cycle for
/// more than a few seconds, and guarantees forward progress through the
/// watchdog. Each check gates on its own interval, so most iterations
/// are cheap no-ops.
pub struct Supervisor<L> {
    cfg: SupervisorConfig,
    link: L,
    heartbeat: Arc<dyn Heartbeat>,
    reconnect_policy: RetryPolicy,
    state: LinkState,
    last_link_check: Option<Instant>,
    last_resync: Option<Instant>,
    last_memory_check: Option<Instant>,
    memory_probe: Box<dyn FnMut() -> u64 + Send>,
}

impl<L: NetworkLink> Supervisor<L> {
    pub fn new(
        cfg: SupervisorConfig,
        link: L,
        reconnect_policy: RetryPolicy,
        heartbeat: Arc<dyn Heartbeat>,
    ) -> Self {
        let mut system = System::new();
        Self {
            cfg,
            link,
            heartbeat,
            reconnect_policy,
            state: LinkState::Up,
            last_link_check: None,
            last_resync: None,
            last_memory_check: None,
            memory_probe: Box::new(move || {
                system.refresh_memory();
                system.available_memory()
            }),
        }
    }

    #[cfg(test)]
    fn with_memory_probe(mut self, probe: impl FnMut() -> u64 + Send + 'static) -> Self {
        self.memory_probe = Box::new(probe);
        self
    }

    pub fn link_state(&self) -> LinkState {
        self.state
    }

    /// Resets the watchdog. Called at least once per main-loop iteration
    /// and inside every bounded wait.
    pub fn heartbeat(&self) {
        self.heartbeat.heartbeat();
    }

    /// Housekeeping for one main-loop iteration.
    pub async fn tick(
        &mut self,
        now: Instant,
        time: &mut dyn TimeSource,
        display: &mut dyn DisplayRenderer,
    ) -> Result<(), FatalCondition> {
        self.heartbeat();
        self.check_link(now, display).await?;
        self.check_time_sync(now, time);
        self.check_memory(now, display);
        Ok(())
    }

    /// Verifies the link and runs the bounded reconnect when it is down.
    /// Calling before the interval elapses is a no-op, not an error.
    pub async fn check_link(
        &mut self,
        now: Instant,
        display: &mut dyn DisplayRenderer,
    ) -> Result<(), FatalCondition> {
        if !due(&mut self.last_link_check, now, self.cfg.link_check_interval) {
            return Ok(());
        }

        if self.link.is_up().await {
            if let LinkState::Recovering(n) = self.state {
                info!("Link is back up after {} failed checks", n);
            }
            self.state = LinkState::Up;
            return Ok(());
        }

        let prior_failures = match self.state {
            LinkState::Up => 0,
            LinkState::Recovering(n) => n,
        };
        warn!(
            "Link down, attempting to reconnect (failure streak: {})",
            prior_failures
        );
        display.show_status(&format!("WiFi Lost! Retry: {}", prior_failures + 1));

        let policy = self.reconnect_policy;
        let heartbeat = Arc::clone(&self.heartbeat);
        let link = &mut self.link;
        let result = policy
            .run(heartbeat.as_ref(), async || link.reconnect().await)
            .await;

        match result {
            Ok(()) => {
                info!("Link reconnected");
                self.state = LinkState::Up;
                if let Err(e) = self.link.apply_static_config().await {
                    warn!("Static address configuration failed after reconnect: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                let failures = prior_failures + 1;
                error!(
                    "Link reconnect failed ({}/{}): {}",
                    failures, self.cfg.max_link_failures, e
                );
                if failures >= self.cfg.max_link_failures {
                    // Orderly fail-safe: final notice on the display, a short
                    // grace so it is visible, then hand the decision up.
                    display.show_status("WiFi Failed! Restarting...");
                    sleep(self.cfg.fatal_grace).await;
                    return Err(FatalCondition::LinkRecoveryExhausted { attempts: failures });
                }
                self.state = LinkState::Recovering(failures);
                Ok(())
            }
        }
    }

    /// Re-pulls authoritative time. Long-running time sources drift, so
    /// this runs on its own cadence whether or not the link ever dropped.
    /// Failures never count toward the link failure budget.
    pub fn check_time_sync(&mut self, now: Instant, time: &mut dyn TimeSource) {
        if !due(&mut self.last_resync, now, self.cfg.resync_interval) {
            return;
        }
        match time.resync() {
            Ok(()) => debug!("Time re-sync successful"),
            Err(e) => warn!("Time re-sync failed, will retry next interval: {}", e),
        }
    }

    /// Advisory only: transient dips are expected and self-resolve, so a
    /// low reading warns but takes no corrective action.
    pub fn check_memory(&mut self, now: Instant, display: &mut dyn DisplayRenderer) {
        if !due(&mut self.last_memory_check, now, self.cfg.memory_check_interval) {
            return;
        }
        let free = (self.memory_probe)();
        if free < self.cfg.memory_floor_bytes {
            warn!(
                "Low memory: {} bytes free (floor {})",
                free, self.cfg.memory_floor_bytes
            );
            display.show_status(&format!("Low Memory! Free: {}KB", free / 1024));
        }
    }
}

fn due(last: &mut Option<Instant>, now: Instant, interval: Duration) -> bool {
    match *last {
        Some(prev) if now.duration_since(prev) < interval => false,
        _ => {
            *last = Some(now);
            true
        }
    }
}
