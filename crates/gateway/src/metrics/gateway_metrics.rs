use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct GatewayMetrics {
    alerts_received: AtomicU64,
    alerts_silenced: AtomicU64,
    reconcile_passes: AtomicU64,
    enrich_errors: AtomicU64,
    sink_accepted: AtomicU64,
    sink_resolved: AtomicU64,
    sink_errors: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_alerts_received(&self) {
        self.alerts_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_alerts_silenced(&self) {
        self.alerts_silenced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reconcile_passes(&self) {
        self.reconcile_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_enrich_errors(&self, count: u64) {
        self.enrich_errors.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_sink_accepted(&self, count: u64) {
        self.sink_accepted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_sink_resolved(&self, count: u64) {
        self.sink_resolved.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_sink_errors(&self, count: u64) {
        self.sink_errors.fetch_add(count, Ordering::Relaxed);
    }

    pub fn alerts_received_val(&self) -> u64 {
        self.alerts_received.load(Ordering::Relaxed)
    }

    pub fn alerts_silenced_val(&self) -> u64 {
        self.alerts_silenced.load(Ordering::Relaxed)
    }

    pub fn reconcile_passes_val(&self) -> u64 {
        self.reconcile_passes.load(Ordering::Relaxed)
    }

    pub fn enrich_errors_val(&self) -> u64 {
        self.enrich_errors.load(Ordering::Relaxed)
    }

    pub fn sink_accepted_val(&self) -> u64 {
        self.sink_accepted.load(Ordering::Relaxed)
    }

    pub fn sink_resolved_val(&self) -> u64 {
        self.sink_resolved.load(Ordering::Relaxed)
    }

    pub fn sink_errors_val(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }
}
