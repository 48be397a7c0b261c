use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use super::model::{Alert, AlertStatus};

#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Encode(serde_json::Error),
    Decode(serde_json::Error),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Encode(e) => write!(f, "encode: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Fingerprint-keyed alert store behind a single reader/writer lock.
///
/// Writers are the ingest path and the reconciler, the inspection endpoint
/// only reads. The lock is never held across an await point; each method
/// acquires and releases it internally.
pub struct AlertBuffer {
    inner: RwLock<HashMap<String, Alert>>,
}

impl Default for AlertBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertBuffer {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new alert as `Pending`, or refreshes `ends_at` and
    /// `last_receive_at` on the entry already stored under its fingerprint.
    /// All other fields of an existing entry are left alone.
    pub fn upsert(&self, mut alert: Alert) {
        let mut map = self.inner.write().expect("alert buffer lock poisoned");
        match map.get_mut(&alert.fingerprint) {
            Some(existing) => {
                existing.ends_at = alert.ends_at;
                existing.last_receive_at = alert.last_receive_at;
            }
            None => {
                alert.status = AlertStatus::Pending;
                map.insert(alert.fingerprint.clone(), alert);
            }
        }
    }

    /// Deep copy of every entry, read lock held only for the copy.
    pub fn snapshot(&self) -> HashMap<String, Alert> {
        self.inner.read().expect("alert buffer lock poisoned").clone()
    }

    /// Read-modify-write under the write lock. Returns false when the
    /// fingerprint is no longer present.
    pub fn apply(&self, fingerprint: &str, f: impl FnOnce(&mut Alert)) -> bool {
        let mut map = self.inner.write().expect("alert buffer lock poisoned");
        match map.get_mut(fingerprint) {
            Some(alert) => {
                f(alert);
                true
            }
            None => false,
        }
    }

    /// Merges a label patch into the live entry; a no-op when the entry has
    /// been deleted since the caller snapshotted it.
    pub fn merge_labels(&self, fingerprint: &str, patch: &HashMap<String, String>) -> bool {
        self.apply(fingerprint, |alert| {
            alert
                .labels
                .extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
        })
    }

    pub fn delete(&self, fingerprint: &str) -> bool {
        self.inner
            .write()
            .expect("alert buffer lock poisoned")
            .remove(fingerprint)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("alert buffer lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indent-formatted JSON dump for the inspection endpoint; read lock held
    /// only while marshaling.
    pub fn to_pretty_json(&self) -> String {
        let map = self.inner.read().expect("alert buffer lock poisoned");
        serde_json::to_string_pretty(&*map).unwrap_or_else(|_| "{}".to_string())
    }

    /// Replaces the buffer contents from a snapshot file. A missing file is
    /// fine (fresh start); malformed contents are an error the caller logs
    /// without failing startup.
    pub fn load(&self, path: &Path) -> Result<usize, SnapshotError> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(SnapshotError::Io(e)),
        };
        let loaded: HashMap<String, Alert> =
            serde_json::from_slice(&data).map_err(SnapshotError::Decode)?;
        let count = loaded.len();
        *self.inner.write().expect("alert buffer lock poisoned") = loaded;
        Ok(count)
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let data = {
            let map = self.inner.read().expect("alert buffer lock poisoned");
            serde_json::to_vec(&*map).map_err(SnapshotError::Encode)?
        };
        std::fs::write(path, data).map_err(SnapshotError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn alert(fingerprint: &str) -> Alert {
        let mut a: Alert = serde_json::from_str(r#"{"labels": {"service": "api"}}"#).unwrap();
        a.fingerprint = fingerprint.to_string();
        a.ends_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 10, 0).unwrap();
        a
    }

    #[test]
    fn upsert_inserts_as_pending() {
        let buffer = AlertBuffer::new();
        let mut a = alert("fp-1");
        a.status = AlertStatus::Firing;
        buffer.upsert(a);
        assert_eq!(buffer.snapshot()["fp-1"].status, AlertStatus::Pending);
    }

    #[test]
    fn upsert_existing_touches_only_ends_at_and_receive_time() {
        let buffer = AlertBuffer::new();
        buffer.upsert(alert("fp-1"));
        buffer.apply("fp-1", |a| a.status = AlertStatus::Firing);

        let mut again = alert("fp-1");
        again.ends_at = Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap();
        again.last_receive_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 30, 0).unwrap();
        again.labels.insert("extra".into(), "ignored".into());
        buffer.upsert(again);

        let stored = &buffer.snapshot()["fp-1"];
        assert_eq!(stored.status, AlertStatus::Firing);
        assert_eq!(stored.ends_at, Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap());
        assert_eq!(
            stored.last_receive_at,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 30, 0).unwrap()
        );
        assert!(!stored.labels.contains_key("extra"));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn snapshot_is_a_deep_copy() {
        let buffer = AlertBuffer::new();
        buffer.upsert(alert("fp-1"));
        let mut snap = buffer.snapshot();
        snap.get_mut("fp-1").unwrap().status = AlertStatus::Resolved;
        assert_eq!(buffer.snapshot()["fp-1"].status, AlertStatus::Pending);
    }

    #[test]
    fn apply_missing_returns_false() {
        let buffer = AlertBuffer::new();
        assert!(!buffer.apply("nope", |_| {}));
    }

    #[test]
    fn merge_labels_into_live_entry() {
        let buffer = AlertBuffer::new();
        buffer.upsert(alert("fp-1"));
        let patch = HashMap::from([("screenshot".to_string(), "2026/fp.png".to_string())]);
        assert!(buffer.merge_labels("fp-1", &patch));
        assert_eq!(buffer.snapshot()["fp-1"].labels["screenshot"], "2026/fp.png");
    }

    #[test]
    fn merge_labels_after_delete_is_noop() {
        let buffer = AlertBuffer::new();
        assert!(!buffer.merge_labels("gone", &HashMap::new()));
    }

    #[test]
    fn delete_existing() {
        let buffer = AlertBuffer::new();
        buffer.upsert(alert("fp-1"));
        assert!(buffer.delete("fp-1"));
        assert!(buffer.is_empty());
        assert!(!buffer.delete("fp-1"));
    }

    #[test]
    fn snapshot_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");

        let buffer = AlertBuffer::new();
        buffer.upsert(alert("fp-1"));
        buffer.upsert(alert("fp-2"));
        buffer.apply("fp-2", |a| a.status = AlertStatus::Firing);
        buffer.save(&path).unwrap();

        let restored = AlertBuffer::new();
        assert_eq!(restored.load(&path).unwrap(), 2);
        assert_eq!(restored.snapshot(), buffer.snapshot());
    }

    #[test]
    fn load_missing_file_is_empty_start() {
        let buffer = AlertBuffer::new();
        assert_eq!(buffer.load(Path::new("/nonexistent/alerts.json")).unwrap(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn load_malformed_contents_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        std::fs::write(&path, b"{not json").unwrap();

        let buffer = AlertBuffer::new();
        assert!(buffer.load(&path).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn pretty_json_contains_entries() {
        let buffer = AlertBuffer::new();
        buffer.upsert(alert("fp-1"));
        let dump = buffer.to_pretty_json();
        assert!(dump.contains("fp-1"));
        assert!(dump.contains("\"status\": \"pending\""));
    }
}
