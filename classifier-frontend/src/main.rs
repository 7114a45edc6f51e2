use classifier_frontend::config::get_configuration;
use classifier_frontend::models::UploadPolicy;
use classifier_frontend::services::{ClassifierClient, metrics::init_metrics};
use classifier_frontend::startup::build_router;
use classifier_frontend::AppState;
use dotenvy::dotenv;
use service_core::observability::init_tracing;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "classifier-frontend",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    init_metrics()?;

    let classifier = Arc::new(ClassifierClient::new(&configuration.classifier)?);
    info!(base_url = %classifier.base_url(), "Using classifier service");

    let upload_policy = UploadPolicy::new(&configuration.upload.allowed_extensions)
        .with_stale_after(configuration.upload.stale_after());
    if upload_policy.allowed_extensions().is_empty() {
        anyhow::bail!("upload.allowed_extensions must name at least one extension");
    }

    let state = AppState::new(classifier, upload_policy)
        .with_max_upload_bytes(configuration.server.max_upload_bytes)
        .with_secure_cookies(configuration.server.secure_cookies);

    let app = build_router(state);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting classifier-frontend on {}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            anyhow::anyhow!("Server error: {}", e)
        })?;

    Ok(())
}
