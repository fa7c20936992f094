// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{routing::get, Router};
use dns_sync::config::Settings;
use dns_sync::constants::{DEFAULT_ETCD_PATH_PREFIX, LOCKS_PREFIX, TOKIO_WORKER_THREADS};
use dns_sync::derive::LabelBasedIntentDeriver;
use dns_sync::events::{DockerEventSource, EventSource};
use dns_sync::metrics;
use dns_sync::registry::etcd::EtcdRegistry;
use dns_sync::registry::Registry;
use dns_sync::sync_engine::SyncEngine;
use std::sync::Arc;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("dns-sync")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting dns-sync");
    debug!("Logging initialized with file and line number tracking");
}

/// Start the Prometheus metrics HTTP server on its own background task.
fn start_metrics_server(settings: &Settings) -> tokio::task::JoinHandle<()> {
    let bind_addr = format!("{}:{}", settings.metrics_bind_address, settings.metrics_port);
    let path = settings.metrics_path.clone();

    info!(
        bind_address = %settings.metrics_bind_address,
        port = settings.metrics_port,
        path = %path,
        "Starting Prometheus metrics HTTP server"
    );

    tokio::spawn(async move {
        async fn metrics_handler() -> String {
            match metrics::gather_metrics() {
                Ok(metrics_text) => metrics_text,
                Err(e) => {
                    error!("Failed to gather metrics: {e}");
                    String::from("# Error gathering metrics\n")
                }
            }
        }

        let app = Router::new().route(&path, get(metrics_handler));

        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind metrics server to {bind_addr}: {e}");
                return;
            }
        };

        info!("Metrics server listening on http://{bind_addr}{path}");

        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {e}");
        }
    })
}

/// Connect the etcd registry and the local Docker event source.
async fn initialize_services(
    settings: &Settings,
) -> Result<(Arc<dyn Registry>, Arc<dyn EventSource>)> {
    debug!(endpoint = %settings.etcd_endpoint(), "Connecting to etcd");
    let registry = EtcdRegistry::connect(
        &settings.etcd_endpoint(),
        settings.etcd_path_prefix.clone(),
        LOCKS_PREFIX.to_string(),
    )
    .await?;
    info!(prefix = DEFAULT_ETCD_PATH_PREFIX, "Connected to etcd registry");

    debug!("Connecting to local Docker daemon");
    let event_source = DockerEventSource::connect_local()?;
    info!("Connected to Docker event source");

    Ok((Arc::new(registry), Arc::new(event_source)))
}

/// Run the sync engine with signal handling for graceful shutdown.
async fn run_with_signal_handling(engine: Arc<SyncEngine>) -> Result<()> {
    info!("Starting sync engine with signal handling");

    let shutdown_result: Result<()> = tokio::select! {
        // Monitor for SIGINT (Ctrl+C)
        result = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            result.map_err(anyhow::Error::from)
        }

        // Monitor for SIGTERM (container runtimes send this on stop)
        result = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                sigterm.recv().await;
                Ok::<(), anyhow::Error>(())
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
                Ok::<(), anyhow::Error>(())
            }
        } => {
            info!("Received SIGTERM, initiating graceful shutdown...");
            result
        }

        result = engine.run() => {
            result.map_err(anyhow::Error::from)
        }
    };

    engine.stop();
    shutdown_result?;
    info!("Graceful shutdown completed successfully");

    Ok(())
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let settings = Settings::from_env();
    info!(hostname = %settings.hostname, "Loaded configuration");

    start_metrics_server(&settings);

    let (registry, event_source) = initialize_services(&settings).await?;
    let deriver = Arc::new(LabelBasedIntentDeriver::new(
        settings.dns_label_key.clone(),
        settings.dns_domain_suffix.clone(),
    ));

    let engine = Arc::new(SyncEngine::new(registry, event_source, deriver, settings));

    run_with_signal_handling(engine).await
}
