use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ingest-time request to postpone `endsAt` by the labeled duration.
pub const DELAY_RESOLVE_LABEL: &str = "alertsforge_delay_resolve";

/// Records the delay that was actually applied at ingest.
pub const DELAYED_RESOLVE_LABEL: &str = "alertsForge_delayed_resolve";

/// Suppresses the resolved notification for this alert.
pub const DO_NOT_SEND_RESOLVED_LABEL: &str = "__alertsforge_do_not_send_resolved";

/// Producer-assigned instance id, dropped before fingerprinting so duplicates
/// that differ only in it collapse to one buffer entry.
pub const UID_LABEL: &str = "uid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Pending,
    Firing,
    Resolved,
}

impl Default for AlertStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Firing => write!(f, "firing"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

/// A single alert as received from the producer and held in the buffer.
/// Identity is the fingerprint; everything else is mutable state. Unknown
/// wire fields are ignored, missing ones take lenient defaults so that any
/// alertmanager-compatible payload ingests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    #[serde(rename = "startsAt", default = "epoch")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "endsAt", default = "epoch")]
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub status: AlertStatus,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(rename = "lastReceiveAt", default = "epoch")]
    pub last_receive_at: DateTime<Utc>,
    #[serde(rename = "lastSinkAt", default = "epoch")]
    pub last_sink_at: DateTime<Utc>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl Alert {
    /// Template context for sink messages and enricher parameters, so
    /// `{{labels.service}}`, `{{status}}` and `{{fingerprint}}` resolve.
    pub fn context(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_wire_payload() {
        let alert: Alert = serde_json::from_str(
            r#"{"labels": {"service": "api"}, "startsAt": "2026-01-01T00:00:00Z", "endsAt": "2026-01-01T00:10:00Z"}"#,
        )
        .unwrap();
        assert_eq!(alert.labels["service"], "api");
        assert_eq!(alert.status, AlertStatus::Pending);
        assert!(alert.fingerprint.is_empty());
        assert_eq!(alert.last_sink_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn tolerates_unknown_fields() {
        let alert: Alert = serde_json::from_str(
            r#"{"labels": {}, "generatorURL": "http://prom/graph", "receivers": []}"#,
        )
        .unwrap();
        assert!(alert.labels.is_empty());
    }

    #[test]
    fn status_round_trips_lowercase() {
        let json = serde_json::to_string(&AlertStatus::Firing).unwrap();
        assert_eq!(json, "\"firing\"");
        let back: AlertStatus = serde_json::from_str("\"resolved\"").unwrap();
        assert_eq!(back, AlertStatus::Resolved);
    }

    #[test]
    fn context_exposes_template_roots() {
        let mut alert: Alert = serde_json::from_str(r#"{"labels": {"severity": "crit"}}"#).unwrap();
        alert.fingerprint = "fp-1".into();
        let ctx = alert.context();
        assert_eq!(ctx["labels"]["severity"], "crit");
        assert_eq!(ctx["fingerprint"], "fp-1");
        assert_eq!(ctx["status"], "pending");
    }
}
