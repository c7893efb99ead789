// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use clap::Parser;
use kube::Client;
use std::sync::Arc;
use tracing::{info, warn};

use nestplane::config::Config;
use nestplane::constants::{CONTROLPLANE_GROUP, CONTROLPLANE_VERSION, INFRASTRUCTURE_GROUP};
use nestplane::kubernetes::crd::all_crds;
use nestplane::kubernetes::{install_crds, wait_for_crd};
use nestplane::reconcilers::{ComponentReconciler, NestedClusterReconciler};
use nestplane::templates::{TemplateSource, TemplateTable, UriFetcher};
use nestplane::types::component::{NestedAPIServer, NestedControllerManager, NestedEtcd};

/// Nestplane - generates and reconciles the components of nested control planes
#[derive(Parser, Debug)]
#[command(name = "nestplane", version, about, long_about = None)]
struct Cli {
    /// Print the CRD manifests and exit
    #[arg(long)]
    crd: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.crd {
        for crd in all_crds() {
            print!("---\n{}", serde_yaml::to_string(&crd)?);
        }
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Nestplane operator");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: template_path={}", config.template_path);

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    if config.install_crds {
        install_crds(&client).await?;
    }

    info!("Waiting for component CRDs to become available...");
    for kind in ["NestedEtcd", "NestedAPIServer", "NestedControllerManager"] {
        wait_for_crd(&client, CONTROLPLANE_GROUP, CONTROLPLANE_VERSION, kind).await?;
    }
    wait_for_crd(&client, INFRASTRUCTURE_GROUP, CONTROLPLANE_VERSION, "NestedCluster").await?;

    let fetcher = UriFetcher::new(config.fetch_timeout)?;
    let source = Arc::new(TemplateSource::new(
        &config.template_path,
        TemplateTable::default(),
        Arc::new(fetcher),
    )?);

    let etcd = ComponentReconciler::<NestedEtcd>::new(client.clone(), source.clone(), config.clone());
    let apiserver =
        ComponentReconciler::<NestedAPIServer>::new(client.clone(), source.clone(), config.clone());
    let controller_manager =
        ComponentReconciler::<NestedControllerManager>::new(client.clone(), source, config.clone());
    let cluster = NestedClusterReconciler::new(client, config);

    info!("Starting reconcilers...");

    tokio::try_join!(
        etcd.run(),
        apiserver.run(),
        controller_manager.run(),
        cluster.run()
    )?;

    // This should never be reached as reconcilers run forever
    warn!("All reconcilers stopped unexpectedly");
    Ok(())
}
