mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use chrono::TimeDelta;
use cowfuel_sheets::{SheetClient, SnapshotCache};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = cowfuel_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let ttl = i64::try_from(config.cache_ttl_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| anyhow::anyhow!("cache TTL out of range: {}s", config.cache_ttl_secs))?;

    let client = SheetClient::from_config(&config)?;
    tracing::info!(
        env = %config.env,
        sheet_host = client.sheet_url().host_str().unwrap_or_default(),
        ttl_secs = config.cache_ttl_secs,
        "starting fuel dashboard API"
    );
    let cache = Arc::new(SnapshotCache::new(client, ttl, config.utc_offset));

    // Fill the cache before the first dashboard request arrives.
    let warm = Arc::clone(&cache);
    tokio::spawn(async move {
        warm.snapshot().await;
    });

    let _scheduler =
        scheduler::build_scheduler(Arc::clone(&cache), config.warm_cron.as_deref()).await?;

    let app = build_app(AppState { cache });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
