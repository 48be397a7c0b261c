mod bucket;
mod grafana;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::alert::Alert;
use crate::config::RunbooksConfig;
use alertsforge_common::labels::match_labels;

pub use bucket::{BucketError, BucketWriter, GcsBucketWriter};
pub use grafana::GrafanaImageEnricher;

pub const GRAFANA_IMAGE: &str = "grafana_image";
pub const KNOWN_ENRICHERS: &[&str] = &[GRAFANA_IMAGE];

/// Labels an enrichment step wants merged into the alert.
pub type LabelPatch = HashMap<String, String>;

#[derive(Debug)]
pub enum EnrichError {
    MissingConfig(String),
    Fetch(String),
    Upload(String),
}

impl std::fmt::Display for EnrichError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingConfig(key) => write!(f, "enrich: missing config parameter '{key}'"),
            Self::Fetch(e) => write!(f, "enrich: fetch: {e}"),
            Self::Upload(e) => write!(f, "enrich: upload: {e}"),
        }
    }
}

impl std::error::Error for EnrichError {}

#[async_trait]
pub trait Enricher: Send + Sync {
    fn name(&self) -> &str;
    async fn enrich(&self, alert: &Alert) -> Result<LabelPatch, EnrichError>;
}

/// The per-alert enrichment pipeline: runbook steps whose selector matches
/// the alert's labels, in configured order. A failing step never aborts the
/// pipeline; its error is collected and the next step still runs.
pub struct Enrichment {
    steps: Vec<Step>,
}

struct Step {
    selector: HashMap<String, String>,
    enricher: Arc<dyn Enricher>,
}

impl Enrichment {
    pub fn new(
        runbooks: &RunbooksConfig,
        client: reqwest::Client,
        bucket: Arc<dyn BucketWriter>,
    ) -> Self {
        let steps = runbooks
            .enrichments
            .iter()
            .filter_map(|step| {
                let enricher: Arc<dyn Enricher> = match step.kind.as_str() {
                    GRAFANA_IMAGE => Arc::new(GrafanaImageEnricher::new(
                        step.config.clone(),
                        client.clone(),
                        bucket.clone(),
                    )),
                    other => {
                        // Validation rejects unknown kinds at startup; a stale
                        // kind here only loses that one step.
                        tracing::warn!(kind = other, "skipping unknown enrichment type");
                        return None;
                    }
                };
                Some(Step {
                    selector: step.labels_selector.clone(),
                    enricher,
                })
            })
            .collect();
        Self { steps }
    }

    /// Test seam: a pipeline from pre-built enrichers.
    pub fn from_steps(steps: Vec<(HashMap<String, String>, Arc<dyn Enricher>)>) -> Self {
        Self {
            steps: steps
                .into_iter()
                .map(|(selector, enricher)| Step { selector, enricher })
                .collect(),
        }
    }

    /// Runs every matching step against a working copy of the alert, so later
    /// steps see the labels earlier ones added. Returns the cumulative patch
    /// and every step error.
    pub async fn enrich_alert(&self, alert: &Alert) -> (LabelPatch, Vec<EnrichError>) {
        let mut working = alert.clone();
        let mut patch = LabelPatch::new();
        let mut errors = Vec::new();

        for step in &self.steps {
            if !match_labels(&working.labels, &step.selector) {
                continue;
            }
            match step.enricher.enrich(&working).await {
                Ok(step_patch) => {
                    working
                        .labels
                        .extend(step_patch.iter().map(|(k, v)| (k.clone(), v.clone())));
                    patch.extend(step_patch);
                }
                Err(e) => {
                    tracing::error!(
                        enricher = step.enricher.name(),
                        fingerprint = %alert.fingerprint,
                        error = %e,
                        "enrichment step failed"
                    );
                    errors.push(e);
                }
            }
        }

        (patch, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticEnricher {
        key: &'static str,
        value: &'static str,
    }

    #[async_trait]
    impl Enricher for StaticEnricher {
        fn name(&self) -> &str {
            "static"
        }

        async fn enrich(&self, _alert: &Alert) -> Result<LabelPatch, EnrichError> {
            Ok(LabelPatch::from([(
                self.key.to_string(),
                self.value.to_string(),
            )]))
        }
    }

    struct FailingEnricher;

    #[async_trait]
    impl Enricher for FailingEnricher {
        fn name(&self) -> &str {
            "failing"
        }

        async fn enrich(&self, _alert: &Alert) -> Result<LabelPatch, EnrichError> {
            Err(EnrichError::Fetch("connection refused".into()))
        }
    }

    fn alert_with(pairs: &[(&str, &str)]) -> Alert {
        let mut alert: Alert = serde_json::from_str(r#"{"labels": {}}"#).unwrap();
        for (k, v) in pairs {
            alert.labels.insert(k.to_string(), v.to_string());
        }
        alert
    }

    fn selector(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn matching_step_patches() {
        let pipeline = Enrichment::from_steps(vec![(
            selector(&[("service", "api")]),
            Arc::new(StaticEnricher { key: "chart", value: "url" }),
        )]);

        let (patch, errors) = pipeline.enrich_alert(&alert_with(&[("service", "api")])).await;
        assert_eq!(patch["chart"], "url");
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn non_matching_step_skipped() {
        let pipeline = Enrichment::from_steps(vec![(
            selector(&[("service", "db")]),
            Arc::new(StaticEnricher { key: "chart", value: "url" }),
        )]);

        let (patch, errors) = pipeline.enrich_alert(&alert_with(&[("service", "api")])).await;
        assert!(patch.is_empty());
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn failing_step_does_not_abort_pipeline() {
        let pipeline = Enrichment::from_steps(vec![
            (selector(&[]), Arc::new(FailingEnricher)),
            (selector(&[]), Arc::new(StaticEnricher { key: "chart", value: "url" })),
        ]);

        let (patch, errors) = pipeline.enrich_alert(&alert_with(&[])).await;
        assert_eq!(patch["chart"], "url");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn later_steps_see_earlier_patches() {
        // Second step only matches on the label the first step adds.
        let pipeline = Enrichment::from_steps(vec![
            (selector(&[]), Arc::new(StaticEnricher { key: "stage", value: "one" })),
            (
                selector(&[("stage", "one")]),
                Arc::new(StaticEnricher { key: "chained", value: "yes" }),
            ),
        ]);

        let (patch, _) = pipeline.enrich_alert(&alert_with(&[])).await;
        assert_eq!(patch["chained"], "yes");
    }
}
