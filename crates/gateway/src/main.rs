use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use alertsforge_gateway::alert::AlertManager;
use alertsforge_gateway::api::{self, AppState};
use alertsforge_gateway::config;
use alertsforge_gateway::enrich::{Enrichment, GcsBucketWriter};
use alertsforge_gateway::metrics::GatewayMetrics;
use alertsforge_gateway::settings::Settings;
use alertsforge_gateway::sink;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let settings = Settings::from_env();

    let runbooks = match config::load_from_file(Path::new(&settings.config_path)) {
        Ok(runbooks) => Arc::new(runbooks),
        Err(e) => {
            tracing::error!(error = %e, path = %settings.config_path, "error during runbooks loading");
            std::process::exit(1);
        }
    };

    let client = match reqwest::Client::builder().timeout(settings.http_timeout).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "can't build HTTP client");
            std::process::exit(1);
        }
    };

    let bucket = Arc::new(GcsBucketWriter::new(client.clone()));
    let enrichment = Arc::new(Enrichment::new(&runbooks, client.clone(), bucket));
    let sink = sink::make_sink(&runbooks.sink, runbooks.clone(), client);
    let metrics = GatewayMetrics::new();

    let manager = Arc::new(AlertManager::new(
        runbooks,
        settings.clone(),
        sink,
        enrichment,
        metrics.clone(),
    ));

    tokio::spawn(manager.clone().run());

    let addr = format!("0.0.0.0:{}", settings.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %addr, "can't bind listen address");
            std::process::exit(1);
        }
    };
    tracing::info!(addr = %addr, "listening");

    let state = AppState {
        manager: manager.clone(),
        metrics,
    };

    tokio::select! {
        result = api::serve(listener, state) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "http server failed");
            }
        }
        _ = wait_for_shutdown() => {
            tracing::info!("shutting down");
            manager.persist();
        }
    }
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "can't install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
