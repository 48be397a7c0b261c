use std::sync::Arc;

use async_trait::async_trait;

use super::{Sink, SinkError, SinkOutcome};
use crate::alert::{Alert, AlertStatus};
use crate::config::RunbooksConfig;
use alertsforge_common::env::env_or;
use alertsforge_common::labels::dedup_preserving_order;
use alertsforge_common::template;

const CHAT_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";
const MESSAGE_RENDER_FALLBACK: &str = "error while rendering sink message";

/// Chat sink posting through the Slack Web API with `AF_SLACK_TOKEN`.
///
/// The channel template renders to a comma-separated target list per alert.
/// A channel render failure still reports the alert as accepted; a broken
/// template must not redeliver the same alert every tick.
pub struct SlackSink {
    runbooks: Arc<RunbooksConfig>,
    client: reqwest::Client,
    token: String,
    api_url: String,
    strict: bool,
}

impl SlackSink {
    pub fn new(runbooks: Arc<RunbooksConfig>, client: reqwest::Client) -> Self {
        Self {
            runbooks,
            client,
            token: env_or("AF_SLACK_TOKEN", ""),
            api_url: CHAT_POST_MESSAGE_URL.to_string(),
            strict: false,
        }
    }

    /// Require every target to succeed before reporting the fingerprint as
    /// delivered, instead of at least one.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Test seam: point the API at a local endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "channel": channel, "text": text }))
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        if body["ok"].as_bool().unwrap_or(false) {
            Ok(())
        } else {
            Err(SinkError::Transport(format!(
                "slack rejected message to {channel}: {}",
                body["error"].as_str().unwrap_or("unknown error")
            )))
        }
    }
}

fn split_targets(rendered: &str) -> Vec<String> {
    dedup_preserving_order(
        rendered
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

fn delivered_enough(strict: bool, delivered: usize, total: usize) -> bool {
    if strict {
        total > 0 && delivered == total
    } else {
        delivered > 0
    }
}

#[async_trait]
impl Sink for SlackSink {
    fn name(&self) -> &str {
        super::SLACK
    }

    async fn send_alerts(&self, alerts: &[Alert]) -> SinkOutcome {
        let mut outcome = SinkOutcome::default();

        for alert in alerts {
            let ctx = alert.context();

            let channel = match template::render(&self.runbooks.slack_message.channel, &ctx) {
                Ok(channel) => channel,
                Err(e) => {
                    outcome.errors.push(SinkError::Template(e.to_string()));
                    outcome.accepted.push(alert.fingerprint.clone());
                    continue;
                }
            };

            let text = template::render_or(
                &self.runbooks.slack_message.message,
                &ctx,
                MESSAGE_RENDER_FALLBACK,
            );

            let targets = split_targets(&channel);
            let total = targets.len();
            let mut delivered = 0;
            for target in targets {
                match self.post_message(&target, &text).await {
                    Ok(()) => delivered += 1,
                    Err(e) => outcome.errors.push(e),
                }
            }

            if delivered_enough(self.strict, delivered, total) {
                if alert.status == AlertStatus::Resolved {
                    outcome.resolved.push(alert.fingerprint.clone());
                } else {
                    outcome.accepted.push(alert.fingerprint.clone());
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlackMessage;

    fn runbooks(channel: &str, message: &str) -> Arc<RunbooksConfig> {
        Arc::new(RunbooksConfig {
            sink: super::super::SLACK.to_string(),
            silences: Vec::new(),
            enrichments: Vec::new(),
            slack_message: SlackMessage {
                channel: channel.to_string(),
                message: message.to_string(),
            },
            oncall_message: Default::default(),
        })
    }

    fn alert(fingerprint: &str) -> Alert {
        let mut a: Alert =
            serde_json::from_str(r#"{"labels": {"service": "api"}}"#).unwrap();
        a.fingerprint = fingerprint.to_string();
        a
    }

    #[test]
    fn split_targets_dedups_and_trims() {
        assert_eq!(
            split_targets("#ops, #dev,#ops,, #dev"),
            vec!["#ops", "#dev"]
        );
        assert!(split_targets("").is_empty());
    }

    #[test]
    fn default_policy_needs_one_delivery() {
        assert!(delivered_enough(false, 1, 3));
        assert!(!delivered_enough(false, 0, 3));
    }

    #[test]
    fn strict_policy_needs_all_deliveries() {
        assert!(delivered_enough(true, 3, 3));
        assert!(!delivered_enough(true, 2, 3));
        assert!(!delivered_enough(true, 0, 0));
    }

    #[tokio::test]
    async fn channel_render_failure_reports_accepted_with_error() {
        // No transport is attempted: the alert is accepted to stop the
        // gateway from re-sending it every tick with the same broken template.
        let sink = SlackSink::new(
            runbooks("{{labels.no_such_channel_label}}", "body"),
            reqwest::Client::new(),
        );

        let outcome = sink.send_alerts(&[alert("fp-1")]).await;
        assert_eq!(outcome.accepted, vec!["fp-1"]);
        assert!(outcome.resolved.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(outcome.errors[0], SinkError::Template(_)));
    }

    #[tokio::test]
    async fn empty_target_list_is_not_a_delivery() {
        let sink = SlackSink::new(runbooks("{{labels.empty}}", "body"), reqwest::Client::new());
        let mut a = alert("fp-1");
        a.labels.insert("empty".into(), "".into());

        let outcome = sink.send_alerts(&[a]).await;
        // Rendered fine but produced no targets: not accepted, retried later.
        assert!(outcome.accepted.is_empty());
        assert!(outcome.errors.is_empty());
    }
}
