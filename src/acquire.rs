use tracing::warn;

use crate::clock::TimeSource;
use crate::display::DisplayRenderer;
use crate::model::{Snapshot, SnapshotCell};
use crate::sensor::{validate, SensorSource};

/// What one acquisition pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Published,
    ClockUnavailable,
    SensorInvalid,
}

/// One acquisition pass: read the clock, read the sensor, validate both,
/// publish. Any failure leaves the previous snapshot untouched and puts
/// an explicit status on the display instead.
pub async fn run_cycle(
    time: &mut dyn TimeSource,
    sensor: &mut dyn SensorSource,
    snapshot: &SnapshotCell,
    display: &mut dyn DisplayRenderer,
) -> CycleOutcome {
    let stamp = match time.now() {
        Ok(stamp) => stamp,
        Err(e) => {
            warn!("Failed to obtain time: {}", e);
            display.show_status("Syncing Time...");
            return CycleOutcome::ClockUnavailable;
        }
    };

    let reading = match sensor.read().and_then(|r| validate(&r).map(|()| r)) {
        Ok(reading) => reading,
        Err(e) => {
            warn!("Sensor reading rejected: {}", e);
            display.show_status("Sensor Error!");
            return CycleOutcome::SensorInvalid;
        }
    };

    snapshot
        .publish(Snapshot {
            temperature: reading.temperature,
            humidity: reading.humidity,
            time: stamp.time,
            date: stamp.date,
            ready: true,
        })
        .await;

    CycleOutcome::Published
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::CivilTime;
    use crate::errors::{Error, Result};
    use crate::sensor::Reading;

    struct FixedClock {
        fail: bool,
    }

    impl TimeSource for FixedClock {
        fn now(&mut self) -> Result<CivilTime> {
            if self.fail {
                return Err(Error::Clock("not synchronized".to_string()));
            }
            Ok(CivilTime {
                time: "14:30:00".to_string(),
                date: "2025-01-01".to_string(),
            })
        }

        fn resync(&mut self) -> Result<()> {
            Ok(())
        }
    }

    struct FixedSensor {
        reading: Result<Reading>,
    }

    impl SensorSource for FixedSensor {
        fn read(&mut self) -> Result<Reading> {
            match &self.reading {
                Ok(r) => Ok(*r),
                Err(_) => Err(Error::Sensor("disconnected".to_string())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingDisplay {
        statuses: Vec<String>,
    }

    impl DisplayRenderer for RecordingDisplay {
        fn render(&mut self, _snapshot: &Snapshot) {}

        fn show_status(&mut self, status: &str) {
            self.statuses.push(status.to_string());
        }
    }

    fn good_reading() -> Result<Reading> {
        Ok(Reading {
            temperature: 25.3,
            humidity: Some(60.2),
        })
    }

    #[test]
    fn success_publishes_ready_snapshot() {
        tokio_test::block_on(async {
            let mut clock = FixedClock { fail: false };
            let mut sensor = FixedSensor {
                reading: good_reading(),
            };
            let cell = SnapshotCell::new();
            let mut display = RecordingDisplay::default();

            let outcome = run_cycle(&mut clock, &mut sensor, &cell, &mut display).await;
            assert_eq!(outcome, CycleOutcome::Published);

            let snapshot = cell.read().await;
            assert!(snapshot.ready);
            assert_eq!(snapshot.temperature, 25.3);
            assert_eq!(snapshot.humidity, Some(60.2));
            assert_eq!(snapshot.time, "14:30:00");
            assert_eq!(snapshot.date, "2025-01-01");
            assert!(display.statuses.is_empty());
        });
    }

    #[test]
    fn clock_failure_preserves_previous_snapshot() {
        tokio_test::block_on(async {
            let cell = SnapshotCell::new();
            let previous = Snapshot {
                temperature: 20.0,
                humidity: Some(50.0),
                time: "12:00:00".to_string(),
                date: "2025-01-01".to_string(),
                ready: true,
            };
            cell.publish(previous.clone()).await;

            let mut clock = FixedClock { fail: true };
            let mut sensor = FixedSensor {
                reading: good_reading(),
            };
            let mut display = RecordingDisplay::default();

            let outcome = run_cycle(&mut clock, &mut sensor, &cell, &mut display).await;
            assert_eq!(outcome, CycleOutcome::ClockUnavailable);
            assert_eq!(cell.read().await, previous);
            assert_eq!(display.statuses, vec!["Syncing Time...".to_string()]);
        });
    }

    #[test]
    fn sensor_failure_preserves_previous_snapshot() {
        tokio_test::block_on(async {
            let cell = SnapshotCell::new();
            let previous = Snapshot {
                temperature: 20.0,
                humidity: Some(50.0),
                time: "12:00:00".to_string(),
                date: "2025-01-01".to_string(),
                ready: true,
            };
            cell.publish(previous.clone()).await;

            let mut clock = FixedClock { fail: false };
            let mut sensor = FixedSensor {
                reading: Err(Error::Sensor("disconnected".to_string())),
            };
            let mut display = RecordingDisplay::default();

            let outcome = run_cycle(&mut clock, &mut sensor, &cell, &mut display).await;
            assert_eq!(outcome, CycleOutcome::SensorInvalid);
            assert_eq!(cell.read().await, previous);
            assert_eq!(display.statuses, vec!["Sensor Error!".to_string()]);
        });
    }

    #[test]
    fn nan_reading_is_treated_as_sensor_error() {
        tokio_test::block_on(async {
            let mut clock = FixedClock { fail: false };
            let mut sensor = FixedSensor {
                reading: Ok(Reading {
                    temperature: f64::NAN,
                    humidity: Some(60.0),
                }),
            };
            let cell = SnapshotCell::new();
            let mut display = RecordingDisplay::default();

            let outcome = run_cycle(&mut clock, &mut sensor, &cell, &mut display).await;
            assert_eq!(outcome, CycleOutcome::SensorInvalid);
            assert!(!cell.read().await.ready);
        });
    }
}
