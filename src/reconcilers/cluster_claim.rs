// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ClusterClaim reconciler - registers fulfilled claims as ManagedClusters.

use crate::config::Config;
use crate::constants::{annotations, finalizers, labels};
use crate::error::{ControllerError, Result};
use crate::kubernetes::finalizer::{add_finalizer_patch, remove_finalizer};
use crate::kubernetes::objects::{delete_unless_terminating, patch_params};
use crate::types::{
    ClusterClaim, ClusterDeployment, ClusterPool, KlusterletAddonConfig, ManagedCluster,
};
use futures::StreamExt;
use kube::{
    api::{Patch, PostParams},
    runtime::{controller::Action, watcher, Controller},
    Api, Client, Resource, ResourceExt,
};
use kube_runtime::controller::Config as ControllerConfig;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct ClusterClaimReconciler {
    client: Client,
    config: Config,
}

impl ClusterClaimReconciler {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let claims: Api<ClusterClaim> = Api::all(self.client.clone());
        let context = Arc::new(self);

        Controller::new(claims, watcher::Config::default())
            .with_config(ControllerConfig::default().concurrency(1))
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled cluster claim: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

pub async fn reconcile(
    claim: Arc<ClusterClaim>,
    ctx: Arc<ClusterClaimReconciler>,
) -> Result<Action> {
    let name = claim.name_any();
    let namespace = claim
        .namespace()
        .ok_or(ControllerError::MissingObjectKey(".metadata.namespace"))?;
    let claims: Api<ClusterClaim> = Api::namespaced(ctx.client.clone(), &namespace);

    // Work from the live object, the watch event may be stale
    let Some(claim) = claims.get_opt(&name).await? else {
        info!("ClusterClaim {}/{} deleted", namespace, name);
        return Ok(Action::await_change());
    };

    let Some(target) = claim.target_cluster().map(str::to_string) else {
        warn!("Waiting for cluster claim {}/{} to complete", namespace, name);
        return Ok(Action::await_change());
    };

    info!(
        "Reconcile cluster {} for cluster claim {}/{}",
        target, namespace, name
    );

    if claim.metadata.deletion_timestamp.is_some() {
        delete_cluster_resources(&ctx.client, &target).await?;
        remove_finalizer(&claims, &claim, finalizers::CLUSTER_CLAIM).await?;
        return Ok(Action::await_change());
    }

    let mut claim_labels = claim.labels().clone();

    if let Some(region) = lookup_region(&ctx.client, &target).await? {
        debug!("Detected region {:?}", region);
        claim_labels.insert(labels::REGION.to_string(), region);
    }

    if let Some(cluster_set) =
        lookup_cluster_set(&ctx.client, &namespace, &claim.spec.cluster_pool_name).await?
    {
        if claim_labels
            .get(labels::CLUSTER_SET)
            .is_none_or(|v| v.is_empty())
        {
            claim_labels.insert(labels::CLUSTER_SET.to_string(), cluster_set);
        }
    }

    // Returning here, not earlier, keeps deletion working for manually imported clusters
    if creation_disabled(&claim) {
        warn!(
            "Skip creation of ManagedCluster and KlusterletAddonConfig for claim {}/{}",
            namespace, name
        );
        return Ok(Action::await_change());
    }

    ensure_managed_cluster(&ctx.client, &name, &target, &claim_labels).await?;

    // Mark the claim so a detached ManagedCluster is never recreated
    let patch = managed_claim_patch(&claim, &claim_labels);
    claims
        .patch(&name, &patch_params(), &Patch::Merge(&patch))
        .await?;
    info!("Cluster claim {}/{} is now managed", namespace, name);

    ensure_addon_config(&ctx.client, &target).await?;

    Ok(Action::await_change())
}

fn error_policy(
    _claim: Arc<ClusterClaim>,
    error: &ControllerError,
    ctx: Arc<ClusterClaimReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(ctx.config.error_requeue)
}

/// Whether the claim asks for no ManagedCluster to be created
pub fn creation_disabled(claim: &ClusterClaim) -> bool {
    claim
        .annotations()
        .get(annotations::CREATE_MANAGED_CLUSTER)
        .is_some_and(|v| v.eq_ignore_ascii_case("false"))
}

/// Single merge patch recording derived labels, the creation switch and our finalizer
fn managed_claim_patch(claim: &ClusterClaim, claim_labels: &BTreeMap<String, String>) -> Value {
    let mut patch = add_finalizer_patch(claim.meta(), finalizers::CLUSTER_CLAIM).unwrap_or_else(
        || json!({ "metadata": { "resourceVersion": claim.metadata.resource_version } }),
    );
    patch["metadata"]["labels"] = json!(claim_labels);
    patch["metadata"]["annotations"] =
        json!(BTreeMap::from([(annotations::CREATE_MANAGED_CLUSTER, "false")]));
    patch
}

/// Region of the cluster's deployment, if the deployment exists
#[instrument(skip(client))]
async fn lookup_region(client: &Client, target: &str) -> Result<Option<String>> {
    let deployments: Api<ClusterDeployment> = Api::namespaced(client.clone(), target);

    match deployments.get_opt(target).await? {
        Some(cd) => Ok(cd.spec.platform.region().map(str::to_string)),
        None => {
            warn!("No ClusterDeployment found for {}", target);
            Ok(None)
        }
    }
}

/// Cluster set label of the claim's pool, if the pool is in a set
#[instrument(skip(client))]
async fn lookup_cluster_set(
    client: &Client,
    namespace: &str,
    pool_name: &str,
) -> Result<Option<String>> {
    let pools: Api<ClusterPool> = Api::namespaced(client.clone(), namespace);

    let Some(pool) = pools.get_opt(pool_name).await? else {
        warn!("No ClusterPool {}/{} found", namespace, pool_name);
        return Ok(None);
    };

    Ok(pool
        .labels()
        .get(labels::CLUSTER_SET)
        .filter(|v| !v.is_empty())
        .cloned())
}

/// Create the ManagedCluster unless one already exists. Existing ones are left untouched.
#[instrument(skip(client, claim_labels))]
async fn ensure_managed_cluster(
    client: &Client,
    claim_name: &str,
    target: &str,
    claim_labels: &BTreeMap<String, String>,
) -> Result<()> {
    let clusters: Api<ManagedCluster> = Api::all(client.clone());

    if clusters.get_opt(target).await?.is_some() {
        debug!("ManagedCluster {} already exists", target);
        return Ok(());
    }

    info!("Creating ManagedCluster {}", target);
    let mc = ManagedCluster::for_claim(claim_name, target, claim_labels);
    clusters.create(&PostParams::default(), &mc).await?;
    Ok(())
}

#[instrument(skip(client))]
async fn ensure_addon_config(client: &Client, target: &str) -> Result<()> {
    let configs: Api<KlusterletAddonConfig> = Api::namespaced(client.clone(), target);

    if configs.get_opt(target).await?.is_some() {
        debug!("KlusterletAddonConfig {}/{} already exists", target, target);
        return Ok(());
    }

    info!("Creating KlusterletAddonConfig {}/{}", target, target);
    configs
        .create(&PostParams::default(), &KlusterletAddonConfig::for_cluster(target))
        .await?;
    Ok(())
}

/// Delete the ManagedCluster and KlusterletAddonConfig of a released claim
#[instrument(skip(client))]
async fn delete_cluster_resources(client: &Client, target: &str) -> Result<()> {
    let clusters: Api<ManagedCluster> = Api::all(client.clone());
    delete_unless_terminating(&clusters, target).await?;

    let configs: Api<KlusterletAddonConfig> = Api::namespaced(client.clone(), target);
    delete_unless_terminating(&configs, target).await?;

    Ok(())
}
