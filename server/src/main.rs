mod cli;
mod controller;
mod downstream;
mod error;
mod precision;
mod publisher;

use clap::Parser;
use l3_engine::{UpstreamEndpoints, UpstreamRestClient};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::controller::Controller;
use crate::downstream::AppState;
use crate::precision::PrecisionCache;

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    let args = cli::Args::parse();

    let filter = args
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cancel = setup_signal_handlers();

    let endpoints = UpstreamEndpoints::default();
    let controller = std::sync::Arc::new(Controller::new(args.symbol.clone(), endpoints.clone()));
    let precision = std::sync::Arc::new(PrecisionCache::new(UpstreamRestClient::new(
        endpoints.rest_base.clone(),
    )));

    let state = AppState { controller, precision };
    let app = downstream::router(state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    info!(symbol = %args.symbol.to_uppercase(), %addr, "l3 server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
            sig.recv().await;
            info!("received SIGTERM, shutting down");
            cancel_clone.cancel();
        });
    }

    cancel
}
