mod exposition;
mod gateway_metrics;

pub use exposition::render_prometheus;
pub use gateway_metrics::GatewayMetrics;
