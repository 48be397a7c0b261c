mod oncall;
mod slack;

use std::sync::Arc;

use async_trait::async_trait;

use crate::alert::Alert;
use crate::config::RunbooksConfig;

pub use oncall::OncallSink;
pub use slack::SlackSink;

pub const SLACK: &str = "slack";
pub const ONCALL: &str = "oncall";
pub const KNOWN_SINKS: &[&str] = &[SLACK, ONCALL];

#[derive(Debug)]
pub enum SinkError {
    Template(String),
    Transport(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template(e) => write!(f, "sink: template: {e}"),
            Self::Transport(e) => write!(f, "sink: transport: {e}"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Per-batch delivery report. `accepted` holds fingerprints delivered while
/// not resolved (firing notifications), `resolved` those delivered in
/// resolved state. `errors` are transport/template failures and are not
/// keyed to fingerprints.
#[derive(Debug, Default)]
pub struct SinkOutcome {
    pub accepted: Vec<String>,
    pub resolved: Vec<String>,
    pub errors: Vec<SinkError>,
}

#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;
    async fn send_alerts(&self, alerts: &[Alert]) -> SinkOutcome;
}

/// Sink selection by runbook tag. Unknown tags fall back to the on-call
/// pager; config validation rejects them before this is reachable.
pub fn make_sink(
    tag: &str,
    runbooks: Arc<RunbooksConfig>,
    client: reqwest::Client,
) -> Arc<dyn Sink> {
    match tag {
        SLACK => Arc::new(SlackSink::new(runbooks, client)),
        _ => Arc::new(OncallSink::new(runbooks, client)),
    }
}
