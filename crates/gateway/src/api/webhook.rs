use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use super::server::AppState;
use crate::alert::Alert;

/// Response envelope for the webhook endpoints; field names are part of the
/// wire contract.
#[derive(Debug, Serialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "Status")]
    pub status: u16,
    #[serde(rename = "Message")]
    pub message: String,
}

fn envelope(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ResponseEnvelope>) {
    (
        status,
        Json(ResponseEnvelope {
            status: status.as_u16(),
            message: message.into(),
        }),
    )
}

/// POST /alertWebhook/api/v2/alerts: ingest a producer batch.
///
/// The body is decoded by hand so a malformed batch gets the envelope back
/// rather than the framework's default rejection.
pub async fn alert_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<ResponseEnvelope>) {
    let alerts: Vec<Alert> = match serde_json::from_slice(&body) {
        Ok(alerts) => alerts,
        Err(e) => {
            tracing::error!(error = %e, "can't decode alert batch");
            return envelope(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    tracing::debug!(count = alerts.len(), "got alerts from producer");
    state.manager.receive_alerts(alerts, Utc::now());
    envelope(StatusCode::OK, "success")
}

/// POST|GET /processAlertBuffer: force one reconciliation pass.
pub async fn process_alert_buffer(
    State(state): State<AppState>,
) -> (StatusCode, Json<ResponseEnvelope>) {
    let errors = state.manager.process_buffer(Utc::now()).await;
    if errors.is_empty() {
        return envelope(StatusCode::OK, "success");
    }

    let joined = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    tracing::error!(errors = %joined, "can't process alerts buffer");
    envelope(StatusCode::OK, joined)
}

/// GET /showAlertBuffer: read-only dump of the live buffer.
pub async fn show_alert_buffer(
    State(state): State<AppState>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        state.manager.dump_buffer(),
    )
}
