use std::ops::AsyncFnMut;
use std::time::Duration;

use crate::watchdog::Heartbeat;

/// Bounded retry: at most `max_attempts` tries with a fixed pause between
/// them. The watchdog is fed before every attempt so the wait itself can
/// never trip it.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub per_attempt_delay: Duration,
}

impl RetryPolicy {
    pub async fn run<T, E>(
        &self,
        heartbeat: &dyn Heartbeat,
        mut attempt_fn: impl AsyncFnMut() -> Result<T, E>,
    ) -> Result<T, E> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            heartbeat.heartbeat();
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => return Err(e),
                Err(_) => tokio::time::sleep(self.per_attempt_delay).await,
            }
        }
    }
}
