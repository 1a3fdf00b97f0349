use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use log::info;
use rpi_neopixel::api;
use rpi_neopixel::config::Config;
use rpi_neopixel::manager::StripManager;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "RPI_NEOPIXEL_CONFIG";
const DEFAULT_CONFIG: &str = "rpi_neopixel.toml";

/// Config path from the first argument, then the environment, then the default.
fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(CONFIG_ENV))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for ctrl-c: {e}");
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
                log::error!("failed to listen for SIGTERM: {e}");
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
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = config_path();
    let config =
        Config::load(&path).with_context(|| format!("loading config {}", path.display()))?;

    let manager = Arc::new(StripManager::from_config(&config).context("opening LED drivers")?);
    manager.initialize_all().await;

    let app = api::router(Arc::clone(&manager), &config.server.feature);
    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "binding {}:{}",
                config.server.host, config.server.port
            )
        })?;
    info!(
        "serving /machine/{} on {}",
        config.server.feature,
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    manager.close().await;
    Ok(())
}
