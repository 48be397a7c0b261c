use std::sync::Arc;

use async_trait::async_trait;

use super::{Sink, SinkError, SinkOutcome};
use crate::alert::{Alert, AlertStatus};
use crate::config::RunbooksConfig;
use alertsforge_common::env::env_or;
use alertsforge_common::template;

const EVENTS_API_URL: &str = "https://events.pagerduty.com/v2/enqueue";
const SUMMARY_RENDER_FALLBACK: &str = "error while rendering sink message";
const SEVERITY_LABEL: &str = "severity";

/// On-call paging sink speaking the Events-v2 dialect. The alert fingerprint
/// doubles as the dedup key, so re-sinks update the open incident and a
/// resolved alert closes it.
pub struct OncallSink {
    runbooks: Arc<RunbooksConfig>,
    client: reqwest::Client,
    routing_key: String,
    events_url: String,
}

impl OncallSink {
    pub fn new(runbooks: Arc<RunbooksConfig>, client: reqwest::Client) -> Self {
        Self {
            runbooks,
            client,
            routing_key: env_or("AF_ONCALL_ROUTING_KEY", ""),
            events_url: EVENTS_API_URL.to_string(),
        }
    }

    /// Test seam: point the events API at a local endpoint.
    pub fn with_events_url(mut self, url: impl Into<String>) -> Self {
        self.events_url = url.into();
        self
    }

    async fn send_event(&self, alert: &Alert, action: &str) -> Result<(), SinkError> {
        let summary = template::render_or(
            &self.runbooks.oncall_message.summary,
            &alert.context(),
            SUMMARY_RENDER_FALLBACK,
        );

        let payload = serde_json::json!({
            "routing_key": self.routing_key,
            "event_action": action,
            "dedup_key": alert.fingerprint,
            "payload": {
                "summary": summary,
                "source": "alertsforge",
                "severity": alert.labels.get(SEVERITY_LABEL).map(String::as_str).unwrap_or("critical"),
                "custom_details": alert.labels,
            },
        });

        self.client
            .post(&self.events_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Sink for OncallSink {
    fn name(&self) -> &str {
        super::ONCALL
    }

    async fn send_alerts(&self, alerts: &[Alert]) -> SinkOutcome {
        let mut outcome = SinkOutcome::default();

        for alert in alerts {
            let action = if alert.status == AlertStatus::Resolved {
                "resolve"
            } else {
                "trigger"
            };

            match self.send_event(alert, action).await {
                Ok(()) => {
                    if alert.status == AlertStatus::Resolved {
                        outcome.resolved.push(alert.fingerprint.clone());
                    } else {
                        outcome.accepted.push(alert.fingerprint.clone());
                    }
                }
                Err(e) => outcome.errors.push(e),
            }
        }

        outcome
    }
}
