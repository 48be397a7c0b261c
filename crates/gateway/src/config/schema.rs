use std::collections::HashMap;

use serde::Deserialize;

/// Declarative runbook configuration: which alerts to silence, how to enrich
/// them, and how sink messages are rendered. Loaded once at startup and
/// shared read-only.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RunbooksConfig {
    #[serde(default = "default_sink")]
    pub sink: String,
    #[serde(default)]
    pub silences: Vec<Silence>,
    #[serde(default)]
    pub enrichments: Vec<EnrichmentStep>,
    #[serde(default)]
    pub slack_message: SlackMessage,
    #[serde(default)]
    pub oncall_message: OncallMessage,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Silence {
    pub labels_selector: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EnrichmentStep {
    pub labels_selector: HashMap<String, String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub config: HashMap<String, String>,
}

/// `channel` renders to a comma-separated target list per alert.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SlackMessage {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct OncallMessage {
    #[serde(default)]
    pub summary: String,
}

fn default_sink() -> String {
    "slack".to_string()
}
