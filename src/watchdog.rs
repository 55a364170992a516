use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::FatalCondition;

/// Anything that can acknowledge the deadman timer. Injected into the
/// bounded-wait loops so tests can run them without a real watchdog.
pub trait Heartbeat: Send + Sync {
    fn heartbeat(&self);
}

/// Process-wide deadman timer: the main loop must heartbeat at least once
/// per timeout window or the monitor declares the process hung. This is
/// the backstop against any unhandled hang, e.g. a blocking call that
/// never returns.
#[derive(Clone)]
pub struct Watchdog {
    started: Instant,
    last_fed_ms: Arc<AtomicU64>,
    timeout: Duration,
}

impl Watchdog {
    pub fn new(timeout: Duration) -> Self {
        Self {
            started: Instant::now(),
            last_fed_ms: Arc::new(AtomicU64::new(0)),
            timeout,
        }
    }

    pub fn starved(&self) -> bool {
        let elapsed = self.started.elapsed().as_millis() as u64;
        let last = self.last_fed_ms.load(Ordering::Relaxed);
        elapsed.saturating_sub(last) > self.timeout.as_millis() as u64
    }

    /// Runs until a full timeout window passes without a heartbeat.
    pub async fn watch(self) -> FatalCondition {
        let period = (self.timeout / 4).max(Duration::from_millis(10));
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if self.starved() {
                return FatalCondition::WatchdogTimeout {
                    timeout_secs: self.timeout.as_secs(),
                };
            }
        }
    }
}

impl Heartbeat for Watchdog {
    fn heartbeat(&self) {
        self.last_fed_ms
            .store(self.started.elapsed().as_millis() as u64, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[test]
    fn fed_watchdog_is_not_starved() {
        tokio_test::block_on(async {
            let watchdog = Watchdog::new(Duration::from_millis(100));
            watchdog.heartbeat();
            sleep(Duration::from_millis(20)).await;
            assert!(!watchdog.starved());
        });
    }

    #[test]
    fn missed_window_starves() {
        tokio_test::block_on(async {
            let watchdog = Watchdog::new(Duration::from_millis(30));
            watchdog.heartbeat();
            sleep(Duration::from_millis(80)).await;
            assert!(watchdog.starved());
        });
    }

    #[test]
    fn watch_reports_timeout() {
        tokio_test::block_on(async {
            let watchdog = Watchdog::new(Duration::from_millis(30));
            let fatal = tokio::time::timeout(Duration::from_secs(2), watchdog.clone().watch())
                .await
                .expect("watchdog monitor should have fired");
            assert_eq!(fatal, FatalCondition::WatchdogTimeout { timeout_secs: 0 });
        });
    }

    #[test]
    fn heartbeat_keeps_monitor_quiet() {
        tokio_test::block_on(async {
            let watchdog = Watchdog::new(Duration::from_millis(100));
            let monitor = tokio::spawn(watchdog.clone().watch());
            for _ in 0..5 {
                watchdog.heartbeat();
                sleep(Duration::from_millis(30)).await;
            }
            assert!(!monitor.is_finished());
            monitor.abort();
        });
    }
}
