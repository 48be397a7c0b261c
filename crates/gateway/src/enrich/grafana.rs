use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::bucket::BucketWriter;
use super::{EnrichError, Enricher, LabelPatch};
use crate::alert::Alert;
use alertsforge_common::env::env_or;
use alertsforge_common::fingerprint::label_set_fingerprint;
use alertsforge_common::template;

const CONFIG_URL: &str = "url";
const CONFIG_TARGET_LABEL: &str = "target_label";
const CONFIG_BUCKET: &str = "bucket";
const PARAM_PREFIX: &str = "param_";

/// Fetches a rendered chart from a Grafana render endpoint and stores the
/// image in the blob store, returning a single-label patch that points at it.
///
/// Config keys: `url`, `target_label`, `bucket`, plus any number of
/// `param_*` entries whose values are templates rendered against the alert
/// and passed as query parameters.
pub struct GrafanaImageEnricher {
    config: HashMap<String, String>,
    client: reqwest::Client,
    bucket: Arc<dyn BucketWriter>,
    bearer: String,
}

impl GrafanaImageEnricher {
    pub fn new(
        config: HashMap<String, String>,
        client: reqwest::Client,
        bucket: Arc<dyn BucketWriter>,
    ) -> Self {
        Self {
            config,
            client,
            bucket,
            bearer: env_or("AF_GRAFANA_BEARER", ""),
        }
    }

    fn require(&self, key: &str) -> Result<&str, EnrichError> {
        self.config
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| EnrichError::MissingConfig(key.to_string()))
    }

    fn query_params(&self, alert: &Alert) -> Vec<(String, String)> {
        let ctx = alert.context();
        let mut params = Vec::new();
        for (key, value) in &self.config {
            let Some(name) = key.strip_prefix(PARAM_PREFIX) else {
                continue;
            };
            match template::render(value, &ctx) {
                Ok(rendered) => params.push((name.to_string(), rendered)),
                Err(e) => {
                    tracing::info!(param = name, template = %value, error = %e, "can't template query parameter, skipping it");
                }
            }
        }
        params
    }
}

#[async_trait]
impl Enricher for GrafanaImageEnricher {
    fn name(&self) -> &str {
        "grafana_image"
    }

    async fn enrich(&self, alert: &Alert) -> Result<LabelPatch, EnrichError> {
        let url = self.require(CONFIG_URL)?;
        let target_label = self.require(CONFIG_TARGET_LABEL)?;
        let bucket = self.require(CONFIG_BUCKET)?;

        let response = self
            .client
            .get(url)
            .query(&self.query_params(alert))
            .bearer_auth(&self.bearer)
            .send()
            .await
            .map_err(|e| EnrichError::Fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| EnrichError::Fetch(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| EnrichError::Fetch(e.to_string()))?;

        let key = object_key(&alert.labels, &self.config, Utc::now());
        self.bucket
            .write(bucket, &key, bytes.to_vec())
            .await
            .map_err(|e| EnrichError::Upload(e.to_string()))?;

        Ok(LabelPatch::from([(target_label.to_string(), key)]))
    }
}

/// Date-prefixed, fingerprint-derived object key. Including the config
/// fingerprint keeps two steps targeting different dashboards from
/// overwriting each other within the same tick.
fn object_key(
    labels: &HashMap<String, String>,
    config: &HashMap<String, String>,
    now: DateTime<Utc>,
) -> String {
    format!(
        "{}/{}{}_{}.png",
        now.format("%Y-%m-%d"),
        label_set_fingerprint(labels),
        label_set_fingerprint(config),
        now.timestamp()
    )
}
