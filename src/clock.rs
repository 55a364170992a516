use chrono::{DateTime, FixedOffset, Utc};
use tracing::debug;

use crate::errors::{Error, Result};

/// A system clock reading earlier than this (2024-01-01 UTC) means the
/// platform has not disciplined the clock yet; an unsynchronized RTC
/// reads as the epoch.
const SYNC_EPOCH_FLOOR: i64 = 1_704_067_200;

/// A wall-clock moment already split into the strings both output paths
/// consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivilTime {
    /// "HH:MM:SS"
    pub time: String,
    /// "YYYY-MM-DD"
    pub date: String,
}

impl CivilTime {
    pub fn from_utc(utc: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = utc.with_timezone(&offset);
        Self {
            time: local.format("%H:%M:%S").to_string(),
            date: local.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Source of authoritative local time. `resync` re-pulls the external
/// reference to correct drift; `now` fails while unsynchronized rather
/// than handing out undefined time.
pub trait TimeSource: Send {
    fn now(&mut self) -> Result<CivilTime>;
    fn resync(&mut self) -> Result<()>;
}

/// Production source: the host clock, which the platform disciplines
/// against the configured server, offset into the configured zone.
pub struct SystemTimeSource {
    offset: FixedOffset,
    server: String,
    synced: bool,
}

impl SystemTimeSource {
    pub fn new(utc_offset_secs: i32, server: impl Into<String>) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_secs)
            .ok_or_else(|| Error::Config(format!("invalid UTC offset: {utc_offset_secs}s")))?;
        Ok(Self {
            offset,
            server: server.into(),
            synced: false,
        })
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&mut self) -> Result<CivilTime> {
        if !self.synced {
            return Err(Error::Clock("time source not synchronized yet".to_string()));
        }
        Ok(CivilTime::from_utc(Utc::now(), self.offset))
    }

    fn resync(&mut self) -> Result<()> {
        if Utc::now().timestamp() < SYNC_EPOCH_FLOOR {
            self.synced = false;
            return Err(Error::Clock(format!(
                "clock not yet disciplined against {}",
                self.server
            )));
        }
        debug!("Time re-synchronized against {}", self.server);
        self.synced = true;
        Ok(())
    }
}
