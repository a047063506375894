mod app;
mod config;
mod error;
mod routes;
mod state;

use std::io;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => tracing::info!("status server stopped"),
        Err(e) => tracing::error!(error = %e, "status server exited with an error"),
    }
}

async fn run() -> io::Result<()> {
    let district_ids = config::district_ids();
    let static_dir = config::static_dir();
    tracing::info!(
        districts = ?district_ids,
        static_dir = %static_dir,
        broadcast_buffer = config::sse_broadcast_buffer(),
        "starting Smart Center status server"
    );

    let app = app::build_app(AppState::new(&district_ids, static_dir));
    let addr = format!("0.0.0.0:{}", config::server_port());
    let listener = TcpListener::bind(&addr).await.inspect_err(|e| {
        tracing::error!(error = %e, %addr, "could not bind listener");
    })?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
}

/// Resolves on Ctrl+C, or SIGTERM on unix. A handler that can't be installed
/// just never fires.
async fn wait_for_shutdown() {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                tracing::warn!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending().await
            }
        }
    };

    tokio::select! {
        name = interrupt => tracing::info!(signal = name, "shutting down"),
        name = terminate() => tracing::info!(signal = name, "shutting down"),
    }
}

#[cfg(unix)]
async fn terminate() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
            "SIGTERM"
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable");
            std::future::pending().await
        }
    }
}

#[cfg(not(unix))]
async fn terminate() -> &'static str {
    std::future::pending().await
}
