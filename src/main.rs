//! Nordic icebreaker exporter

use std::sync::Arc;

use icebreaker_exporter::{
    client::DigitrafficClient,
    config::AppConfig,
    errors::ExporterError,
    exporter::Exporter,
    server::{build_router, AppState},
    snapshot::SnapshotCache,
};
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), ExporterError> {
    #[cfg(feature = "dotenvy")]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration, preferring environment variables and config files
    let config = AppConfig::load()?;
    if let Err(e) = config.validate() {
        error!("{}", e);
        return Err(e);
    }

    let cache = Arc::new(SnapshotCache::new());
    let client = DigitrafficClient::new(&config.digitraffic.user)?;
    let exporter = Exporter::new(
        client,
        config.digitraffic.clone(),
        config.vessels.allow_list(),
        cache.clone(),
    );

    let cancel = CancellationToken::new();
    let refresh_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { exporter.run(cancel).await })
    };

    let app = build_router(AppState::new(cache, &config.server.metrics_path));
    let listener = TcpListener::bind(config.server.listen_address.as_str()).await?;

    info!(
        address = %config.server.listen_address,
        metrics_path = %config.server.metrics_path,
        "starting nordic icebreaker exporter"
    );

    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => info!("Received shutdown signal"),
                _ = shutdown.cancelled() => {}
            }
        })
        .await;

    cancel.cancel();
    if let Err(e) = refresh_task.await {
        error!("Refresh task failed: {}", e);
    }

    served?;
    Ok(())
}
