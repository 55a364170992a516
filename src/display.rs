use tracing::info;

use crate::model::Snapshot;

/// Output side of the device screen. `render` draws the full readout;
/// `show_status` replaces it with an explicit state string so a failed
/// cycle is never shown as stale or blank data.
pub trait DisplayRenderer: Send {
    fn render(&mut self, snapshot: &Snapshot);
    fn show_status(&mut self, status: &str);
}

/// Terminal stand-in for the device OLED: one log line per frame with the
/// same date / time / reading layout.
pub struct ConsoleDisplay;

impl DisplayRenderer for ConsoleDisplay {
    fn render(&mut self, snapshot: &Snapshot) {
        match snapshot.humidity {
            Some(humidity) => info!(
                "[display] {}  {}  {:.1}°C {:.1}%",
                snapshot.date, snapshot.time, snapshot.temperature, humidity
            ),
            None => info!(
                "[display] {}  {}  {:.1}°C",
                snapshot.date, snapshot.time, snapshot.temperature
            ),
        }
    }

    fn show_status(&mut self, status: &str) {
        info!("[display] {}", status);
    }
}
