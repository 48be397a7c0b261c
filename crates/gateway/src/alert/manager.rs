use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use super::buffer::AlertBuffer;
use super::model::{
    Alert, AlertStatus, DELAYED_RESOLVE_LABEL, DELAY_RESOLVE_LABEL, DO_NOT_SEND_RESOLVED_LABEL,
    UID_LABEL,
};
use crate::config::RunbooksConfig;
use crate::enrich::{EnrichError, Enrichment};
use crate::metrics::GatewayMetrics;
use crate::settings::Settings;
use crate::sink::{Sink, SinkError};
use alertsforge_common::env::{format_duration, parse_duration};
use alertsforge_common::fingerprint::label_set_fingerprint;
use alertsforge_common::labels::match_labels;

const TICK_INTERVAL: Duration = Duration::from_secs(10);
const ENRICH_CONCURRENCY: usize = 8;

#[derive(Debug)]
pub enum ProcessError {
    Enrich(EnrichError),
    Sink(SinkError),
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enrich(e) => write!(f, "{e}"),
            Self::Sink(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ProcessError {}

/// The alert manager: the fingerprint-keyed buffer plus the reconciliation
/// pass that advances each alert through pending → firing → resolved,
/// enriching and dispatching along the way.
///
/// Two writers touch the buffer (ingest and the reconciler) and each locked
/// section covers a single fingerprint, so an ingest may interleave with a
/// running pass; the reconcile step only rewrites `status` and
/// `last_sink_at`, letting a concurrent ingest's `ends_at` refresh survive.
pub struct AlertManager {
    buffer: AlertBuffer,
    runbooks: Arc<RunbooksConfig>,
    settings: Settings,
    sink: Arc<dyn Sink>,
    enrichment: Arc<Enrichment>,
    metrics: Arc<GatewayMetrics>,
}

impl AlertManager {
    pub fn new(
        runbooks: Arc<RunbooksConfig>,
        settings: Settings,
        sink: Arc<dyn Sink>,
        enrichment: Arc<Enrichment>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let buffer = AlertBuffer::new();
        if let Some(path) = &settings.storage_path {
            match buffer.load(Path::new(path)) {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, path = %path, "restored alert buffer"),
                Err(e) => tracing::error!(error = %e, path = %path, "can't read alerts state"),
            }
        }
        Self {
            buffer,
            runbooks,
            settings,
            sink,
            enrichment,
            metrics,
        }
    }

    /// Ticker-driven reconciliation. The tick body is awaited inline, so
    /// passes never overlap.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let errors = self.process_buffer(Utc::now()).await;
            if !errors.is_empty() {
                tracing::warn!(
                    errors = errors.len(),
                    "buffer processing was not completely successful"
                );
            }
        }
    }

    /// Ingests one producer batch: silences, fingerprints, applies resolve
    /// delays and upserts into the buffer.
    pub fn receive_alerts(&self, alerts: Vec<Alert>, now: DateTime<Utc>) {
        for mut alert in alerts {
            if self
                .runbooks
                .silences
                .iter()
                .any(|silence| match_labels(&alert.labels, &silence.labels_selector))
            {
                tracing::debug!(labels = ?alert.labels, "alert silenced");
                self.metrics.inc_alerts_silenced();
                continue;
            }

            alert.last_receive_at = now;

            let mut fp_labels = alert.labels.clone();
            fp_labels.remove(UID_LABEL);
            alert.fingerprint = label_set_fingerprint(&fp_labels);

            self.apply_resolve_delay(&mut alert);

            self.metrics.inc_alerts_received();
            self.buffer.upsert(alert);
        }
    }

    /// Postpones `ends_at` by the alert's own delay label, falling back to
    /// the process-wide default. The applied delay is recorded as a label;
    /// an unparseable delay leaves `ends_at` alone.
    fn apply_resolve_delay(&self, alert: &mut Alert) {
        let delay = match alert.labels.get(DELAY_RESOLVE_LABEL) {
            Some(value) => match parse_duration(value) {
                Ok(d) => Some(d),
                Err(e) => {
                    tracing::error!(value = %value, error = %e, "can't parse delay duration");
                    None
                }
            },
            None => self.settings.default_resolve_delay,
        };

        if let Some(delay) = delay {
            alert.ends_at = alert.ends_at + to_chrono(delay);
            alert
                .labels
                .insert(DELAYED_RESOLVE_LABEL.to_string(), format_duration(delay));
        }
    }

    /// One reconciliation pass over a snapshot of the buffer.
    pub async fn process_buffer(&self, now: DateTime<Utc>) -> Vec<ProcessError> {
        tracing::debug!("starting processing of alert buffer");
        self.metrics.inc_reconcile_passes();

        let snapshot = self.buffer.snapshot();
        tracing::debug!(count = snapshot.len(), "alerts in buffer");

        let mut errors: Vec<ProcessError> = Vec::new();
        let mut to_send: Vec<Alert> = Vec::new();
        let mut pending: Vec<Alert> = Vec::new();

        for (fingerprint, alert) in snapshot {
            if alert.ends_at < now {
                if alert.status == AlertStatus::Pending {
                    tracing::warn!(%fingerprint, "alert expired before first delivery, dropping");
                    self.buffer.delete(&fingerprint);
                } else if alert.labels.contains_key(DO_NOT_SEND_RESOLVED_LABEL) {
                    tracing::info!(%fingerprint, "resolved notification suppressed, dropping");
                    self.buffer.delete(&fingerprint);
                } else {
                    tracing::info!(%fingerprint, "alert past its end time, resolving");
                    let mut resolved = alert;
                    resolved.status = AlertStatus::Resolved;
                    to_send.push(resolved);
                }
                continue;
            }

            match alert.status {
                AlertStatus::Pending => pending.push(alert),
                AlertStatus::Firing => {
                    if let Some(resink) = self.settings.resink_interval {
                        if now.signed_duration_since(alert.last_sink_at) >= to_chrono(resink) {
                            tracing::info!(%fingerprint, "re-sink interval elapsed");
                            to_send.push(alert);
                        }
                    }
                }
                AlertStatus::Resolved => {}
            }
        }

        // Enrich pending alerts with bounded parallelism; collect() is the
        // barrier, nothing is dispatched until every task has finished.
        let enriched: Vec<(Alert, Vec<EnrichError>)> = stream::iter(pending.into_iter().map(
            |alert| async move {
                let (patch, step_errors) = self.enrichment.enrich_alert(&alert).await;
                let mut alert = alert;
                if !patch.is_empty() {
                    self.buffer.merge_labels(&alert.fingerprint, &patch);
                    alert.labels.extend(patch);
                }
                (alert, step_errors)
            },
        ))
        .buffer_unordered(ENRICH_CONCURRENCY)
        .collect()
        .await;

        for (alert, step_errors) in enriched {
            self.metrics.add_enrich_errors(step_errors.len() as u64);
            errors.extend(step_errors.into_iter().map(ProcessError::Enrich));
            to_send.push(alert);
        }

        if to_send.is_empty() {
            tracing::debug!("finished processing of alert buffer");
            return errors;
        }

        tracing::info!(count = to_send.len(), sink = self.sink.name(), "dispatching alerts");
        let outcome = self.sink.send_alerts(&to_send).await;

        for err in &outcome.errors {
            tracing::error!(error = %err, "error while sending alert");
        }
        self.metrics.add_sink_errors(outcome.errors.len() as u64);
        self.metrics.add_sink_accepted(outcome.accepted.len() as u64);
        self.metrics.add_sink_resolved(outcome.resolved.len() as u64);

        for fingerprint in &outcome.accepted {
            self.buffer.apply(fingerprint, |alert| {
                if alert.status == AlertStatus::Firing {
                    tracing::info!(%fingerprint, "alert re-sunk");
                } else {
                    tracing::info!(%fingerprint, from = %alert.status, "alert now firing");
                    alert.status = AlertStatus::Firing;
                }
                alert.last_sink_at = now;
            });
        }
        for fingerprint in &outcome.resolved {
            tracing::info!(%fingerprint, "deleting resolved alert from buffer");
            self.buffer.delete(fingerprint);
        }

        if !outcome.accepted.is_empty() || !outcome.resolved.is_empty() {
            self.persist();
        }

        errors.extend(outcome.errors.into_iter().map(ProcessError::Sink));
        tracing::debug!("finished processing of alert buffer");
        errors
    }

    /// Best-effort snapshot save; no-op without a configured storage path.
    pub fn persist(&self) {
        if let Some(path) = &self.settings.storage_path {
            if let Err(e) = self.buffer.save(Path::new(path)) {
                tracing::error!(error = %e, path = %path, "can't save alerts state");
            }
        }
    }

    /// Indent-formatted JSON dump for the inspection endpoint.
    pub fn dump_buffer(&self) -> String {
        self.buffer.to_pretty_json()
    }

    #[cfg(test)]
    pub(crate) fn buffer(&self) -> &AlertBuffer {
        &self.buffer
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::milliseconds(i64::MAX))
}
