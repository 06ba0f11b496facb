// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use authkit_gateway::{
    api::router,
    auth::AuthGate,
    config::{AuthKitConfig, ConfigGate, LogFormat, ServerConfig},
    proxy::UpstreamProxy,
    state::AppState,
};
use tracing_subscriber::EnvFilter;

/// Gate configuration, resolved once for the whole process.
static GATE_CONFIG: ConfigGate = ConfigGate::new();

#[tokio::main]
async fn main() {
    let server = ServerConfig::from_env().expect("Invalid server configuration");
    init_tracing(server.log_format);

    let raw = AuthKitConfig::load().expect("Failed to load AuthKit configuration");
    let gate = AuthGate::new(GATE_CONFIG.get_or_resolve(&raw));

    let proxy = UpstreamProxy::new(server.upstream_url.clone(), server.upstream_timeout)
        .expect("Failed to create HTTP client");

    let app = router(AppState::new(gate, proxy));

    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port))
        .await
        .expect("Failed to bind listen address");
    let addr = listener
        .local_addr()
        .expect("Failed to read listen address");

    tracing::info!(%addr, upstream = %server.upstream_url, "AuthKit gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server failed");
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
