// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use futures::future::{try_join_all, BoxFuture, FutureExt};
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clusterclaims_controller::config::Config;
use clusterclaims_controller::kubernetes::wait_for_crds;
use clusterclaims_controller::reconcilers::{
    ClusterClaimReconciler, ClusterPoolReconciler, ManagedClusterReconciler,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting clusterclaims controller");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config);

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    if config.wait_for_crds {
        info!("Waiting for CRDs to become available...");
        wait_for_crds(&client, &config).await?;
    }

    let mut controllers: Vec<BoxFuture<'static, Result<()>>> = Vec::new();
    if config.enable_cluster_claims {
        info!("Starting ClusterClaim controller");
        let reconciler = ClusterClaimReconciler::new(client.clone(), config.clone());
        controllers.push(reconciler.run().boxed());
    }
    if config.enable_cluster_pools {
        info!("Starting ClusterPool controller");
        let reconciler = ClusterPoolReconciler::new(client.clone(), config.clone());
        controllers.push(reconciler.run().boxed());
    }
    if config.enable_managed_clusters {
        info!("Starting ManagedCluster controller");
        let reconciler = ManagedClusterReconciler::new(client.clone(), config.clone());
        controllers.push(reconciler.run().boxed());
    }

    if controllers.is_empty() {
        warn!("No controllers enabled, exiting");
        return Ok(());
    }

    // Controllers run until a termination signal arrives
    try_join_all(controllers).await?;

    info!("All controllers stopped");
    Ok(())
}
