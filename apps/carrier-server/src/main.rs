#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
mod cli;
mod config;
mod logging;
mod providers;

use std::sync::Arc;

use anyhow::{Context, Result};
use api_gateway::{Gateway, VersionInfo};
use authz_resolver::{Authorizer, HttpAccessReviewer, StaticRestMapper};
use carrier_auth::AuthChain;
use carrier_http::ClusterClient;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::providers::{ClusterBackends, build_registry};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        () = ctrl_c => tracing::info!("received SIGINT"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ---- Providers and CLI ----
    let backends = Arc::new(ClusterBackends::default());
    let registry = build_registry(&backends).context("registering authentication providers")?;
    let (cli, matches) = match Cli::parse_with(&registry, std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => e.exit(),
    };

    // ---- Config ----
    let config = config::load_config(cli.config.as_deref())?;

    // ---- Tracing ----
    logging::init(&config.logging)?;
    tracing::info!(
        config_path = ?cli.config,
        modes = ?cli.authentication_mode,
        "starting carrier-server"
    );

    // ---- Cluster ----
    let cluster = ClusterClient::from_config(&config.cluster).context("building cluster client")?;
    backends.connect(&cluster);
    tracing::info!(server = %cluster.base_url(), "cluster client ready");

    // ---- Authentication ----
    let chain = AuthChain::from_registry(&registry, cli.authentication_mode.as_slice(), &matches)
        .await
        .context("initialising authentication providers")?;

    // ---- Authorization ----
    let authorizer = Authorizer::new(
        Arc::new(StaticRestMapper::from_config(&config.rest_mappings)),
        Arc::new(HttpAccessReviewer::new(cluster)),
    );

    // ---- Serve ----
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    Gateway::new(config.server, chain, authorizer)
        .with_version(VersionInfo::current(env!("CARGO_PKG_VERSION")))
        .serve(shutdown)
        .await
        .context("HTTP server error")?;

    tracing::info!("carrier-server stopped");
    Ok(())
}
