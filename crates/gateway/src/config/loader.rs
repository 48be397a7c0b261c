use std::path::Path;

use super::schema::RunbooksConfig;
use crate::enrich;
use crate::sink;

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    Validation(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Validation(msg) => write!(f, "validation: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_yaml::Error> for LoadError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e)
    }
}

pub fn load_from_file(path: &Path) -> Result<RunbooksConfig, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<RunbooksConfig, LoadError> {
    let cfg: RunbooksConfig = serde_yaml::from_str(yaml)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &RunbooksConfig) -> Result<(), LoadError> {
    if !sink::KNOWN_SINKS.contains(&cfg.sink.as_str()) {
        return Err(LoadError::Validation(format!(
            "unknown sink '{}', expected one of {:?}",
            cfg.sink,
            sink::KNOWN_SINKS
        )));
    }

    for step in &cfg.enrichments {
        if !enrich::KNOWN_ENRICHERS.contains(&step.kind.as_str()) {
            return Err(LoadError::Validation(format!(
                "unknown enrichment type '{}', expected one of {:?}",
                step.kind,
                enrich::KNOWN_ENRICHERS
            )));
        }
    }

    match cfg.sink.as_str() {
        sink::SLACK => {
            if cfg.slack_message.channel.is_empty() {
                return Err(LoadError::Validation(
                    "slack_message.channel must not be empty".into(),
                ));
            }
            if cfg.slack_message.message.is_empty() {
                return Err(LoadError::Validation(
                    "slack_message.message must not be empty".into(),
                ));
            }
        }
        sink::ONCALL => {
            if cfg.oncall_message.summary.is_empty() {
                return Err(LoadError::Validation(
                    "oncall_message.summary must not be empty".into(),
                ));
            }
        }
        _ => {}
    }

    Ok(())
}
