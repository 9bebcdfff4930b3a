//! `salex-vault`: sales API binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (tracing + optional OTLP export).
//! 3. Build the [`FieldCodec`](crypto::FieldCodec) from `ENCRYPTION_KEY` and self-test it.
//! 4. Create the document store and the owner-scoped [`Repository`].
//! 5. Build the Axum router and start the HTTP server.

mod config;
mod crypto;
mod mapping;
mod server;
mod store;
mod telemetry;

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use config::Config;
use server::state::AppState;
use store::{DocumentStore, Repository};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        "salex-vault starting"
    );

    // -----------------------------------------------------------------------
    // 3. Field codec
    // -----------------------------------------------------------------------
    let codec = cfg.field_codec()?;
    codec
        .self_test()
        .context("field codec failed its startup self-test")?;
    info!("field encryption ready");

    // -----------------------------------------------------------------------
    // 4. Persistence
    // -----------------------------------------------------------------------
    let repo = Repository::new(DocumentStore::new(), codec);

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(repo, cfg.user_header_name.clone());
    let router = server::router::build(state, Duration::from_secs(cfg.request_timeout_secs));

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
