use axum::extract::State;

use super::server::AppState;
use crate::metrics::render_prometheus;

pub async fn metrics(State(state): State<AppState>) -> String {
    render_prometheus(&state.metrics)
}
