//! Implementation of the `thunderguard serve` command.

use anyhow::Result;
use clap::Args;

use super::build_product_service;
use crate::adapters::cache::spawn_expiry_sweeper;
use crate::adapters::http::ProductsHttpServer;
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind address (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, config: &Config) -> Result<()> {
    let mut server_config = config.server.clone();
    if let Some(host) = args.host {
        server_config.host = host;
    }
    if let Some(port) = args.port {
        server_config.port = port;
    }

    let (service, cache) = build_product_service(config).await?;
    let sweeper = spawn_expiry_sweeper(cache, config.cache.sweep_interval());
    let server = ProductsHttpServer::new(service, server_config);

    let served = server
        .serve_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                return;
            }
            tracing::info!("shutdown signal received");
        })
        .await
        .map_err(|e| anyhow::anyhow!("Products HTTP server failed: {e}"));

    sweeper.abort();
    served
}
