use std::sync::Arc;

use super::gateway_metrics::GatewayMetrics;

pub fn render_prometheus(m: &Arc<GatewayMetrics>) -> String {
    let mut out = String::with_capacity(1024);

    write_counter(&mut out, "alertsforge_gateway_alerts_received_total", m.alerts_received_val());
    write_counter(&mut out, "alertsforge_gateway_alerts_silenced_total", m.alerts_silenced_val());
    write_counter(&mut out, "alertsforge_gateway_reconcile_passes_total", m.reconcile_passes_val());
    write_counter(&mut out, "alertsforge_gateway_enrich_errors_total", m.enrich_errors_val());
    write_counter(&mut out, "alertsforge_gateway_sink_accepted_total", m.sink_accepted_val());
    write_counter(&mut out, "alertsforge_gateway_sink_resolved_total", m.sink_resolved_val());
    write_counter(&mut out, "alertsforge_gateway_sink_errors_total", m.sink_errors_val());

    out
}

fn write_counter(out: &mut String, name: &str, val: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {val}");
}
