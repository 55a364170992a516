use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The single most-recent validated reading plus the civil time it was
/// taken at, shared between the acquisition cycle and both output paths.
///
/// `ready` stays false until the first valid acquisition; no output path
/// may treat the other fields as meaningful before then.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// "HH:MM:SS"
    pub time: String,
    /// "YYYY-MM-DD"
    pub date: String,
    pub ready: bool,
}

/// Holder for the current snapshot. The acquisition cycle is the only
/// writer and always replaces the whole record in one swap, so readers
/// never observe a half-written value; readers get a clone, never a live
/// reference.
#[derive(Clone, Default)]
pub struct SnapshotCell {
    inner: Arc<RwLock<Snapshot>>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, snapshot: Snapshot) {
        *self.inner.write().await = snapshot;
    }

    pub async fn read(&self) -> Snapshot {
        self.inner.read().await.clone()
    }
}

/// All user-facing numbers are fixed to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_not_ready() {
        tokio_test::block_on(async {
            let cell = SnapshotCell::new();
            assert!(!cell.read().await.ready);
        });
    }

    #[test]
    fn publish_replaces_whole_record() {
        tokio_test::block_on(async {
            let cell = SnapshotCell::new();
            cell.publish(Snapshot {
                temperature: 25.3,
                humidity: Some(60.2),
                time: "14:30:00".to_string(),
                date: "2025-01-01".to_string(),
                ready: true,
            })
            .await;

            let snapshot = cell.read().await;
            assert!(snapshot.ready);
            assert_eq!(snapshot.temperature, 25.3);
            assert_eq!(snapshot.humidity, Some(60.2));
            assert_eq!(snapshot.time, "14:30:00");
            assert_eq!(snapshot.date, "2025-01-01");
        });
    }

    #[test]
    fn humidity_omitted_from_json_when_absent() {
        let snapshot = Snapshot {
            temperature: 21.0,
            humidity: None,
            time: "08:00:00".to_string(),
            date: "2025-06-01".to_string(),
            ready: true,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("humidity").is_none());
        assert_eq!(value["temperature"], 21.0);
    }

    #[test]
    fn round1_fixes_one_decimal() {
        assert_eq!(round1(25.34), 25.3);
        assert_eq!(round1(25.35), 25.4);
        assert_eq!(round1(-0.04), -0.0);
        assert_eq!(round1(60.0), 60.0);
    }
}
