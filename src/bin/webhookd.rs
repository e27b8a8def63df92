//! Long-running HTTP front for the callback endpoints.

use std::net::SocketAddr;
use std::process::ExitCode;

use billmgr_plugins::adapters::http::{callback_router, CallbackAppState};
use billmgr_plugins::logging;
use billmgr_plugins::plugin::PluginContext;

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler not installed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler not installed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match PluginContext::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init_stdout(&config.logging);

    let addr = match config.server.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "Invalid listen address");
            return ExitCode::FAILURE;
        }
    };
    let context = match PluginContext::production(config) {
        Ok(context) => context,
        Err(e) => {
            tracing::error!(error = %e, "Adapters not initialised");
            return ExitCode::FAILURE;
        }
    };
    let app = callback_router(CallbackAppState::new(context.callback_router()));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Bind failed");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(addr = %addr, "webhookd listening");

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server stopped with error");
            ExitCode::FAILURE
        }
    }
}
