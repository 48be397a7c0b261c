use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use super::{health, metrics, webhook};
use crate::alert::AlertManager;
use crate::metrics::GatewayMetrics;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<AlertManager>,
    pub metrics: Arc<GatewayMetrics>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/metrics", get(metrics::metrics))
        .route("/alertWebhook/api/v2/alerts", post(webhook::alert_webhook))
        .route(
            "/processAlertBuffer",
            post(webhook::process_alert_buffer).get(webhook::process_alert_buffer),
        )
        .route("/showAlertBuffer", get(webhook::show_alert_buffer))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    axum::serve(listener, app).await
}
