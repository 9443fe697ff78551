// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use studioctl::cli::{Cli, Commands};
use studioctl::config::Config;
use studioctl::kubernetes::{ConnectionConfig, ConnectionHolder};
use studioctl::provision::run_create;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Create(args) => {
            let config = Config::from_args(cli.kubeconfig.clone(), args)?;
            info!(
                "Configuration loaded: namespace={}, local={}",
                config.namespace, config.local
            );

            let explicit = match &config.kubeconfig {
                Some(path) => Some(ConnectionConfig::from_kubeconfig_file(path).await?),
                None => None,
            };
            let connection = ConnectionHolder::new();
            connection
                .set_config(explicit)
                .await
                .context("Failed to configure the cluster connection")?;
            info!("Cluster connection configured");

            let stop = CancellationToken::new();
            let report = run_create(&connection, &config, &stop).await?;
            info!("Done, {} resources created", report.created_count());
        }
    }

    Ok(())
}
