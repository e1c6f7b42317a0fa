pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod console;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;
pub mod views;

use std::sync::Arc;
use tokio::io::BufReader;
use tokio::signal;

use anyhow::Context;
pub use config::Config;
use console::ControlExit;
use state::SharedState;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Starts the web server on `port` and blocks until it is told to stop,
/// either by `stop` on standard input or by Ctrl+C.
pub async fn run(config: Config, port: u16) -> anyhow::Result<()> {
    init_tracing(&config);
    match &config.source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    info!("Cat Search v{} starting...", env!("CARGO_PKG_VERSION"));

    let shared = Arc::new(SharedState::new(&config).await?);
    let app = api::router(api::create_app_state(shared.clone(), prometheus_handle));

    let addr = format!("{}:{}", config.server.bind_address, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        let shutdown = async {
            shutdown_rx.await.ok();
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("Web server error: {}", e);
        }
    });

    println!("Web server started and running at http://localhost:{port}");
    info!(%addr, "Web server listening");

    wait_for_shutdown().await;

    let _ = shutdown_tx.send(());
    if let Err(e) = server_handle.await {
        error!("Web server task failed: {}", e);
    }

    if let Err(e) = shared.store.clone().close().await {
        warn!("Failed to close database: {:#}", e);
    }

    info!("Server stopped");
    Ok(())
}

async fn wait_for_shutdown() {
    let control = async {
        let input = BufReader::new(tokio::io::stdin());
        match console::run_control_loop(input, tokio::io::stdout()).await {
            Ok(ControlExit::Stop) => {}
            Ok(ControlExit::InputClosed) => std::future::pending::<()>().await,
            Err(e) => {
                error!("Control input failed: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = control => {
            info!("Shutting down the server");
        }
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => error!("Error listening for shutdown: {}", e),
        },
    }
}
