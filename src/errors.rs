use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("clock error: {0}")]
    Clock(String),

    #[error("link error: {0}")]
    Link(String),

    #[error("sensor error: {0}")]
    Sensor(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Conditions that end the process. Components only report these; the
/// orchestration layer in `main` is the single place that performs the
/// actual restart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FatalCondition {
    #[error("link recovery failed {attempts} consecutive times")]
    LinkRecoveryExhausted { attempts: u32 },

    #[error("watchdog starved for more than {timeout_secs}s")]
    WatchdogTimeout { timeout_secs: u64 },
}
