// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ManagedCluster reconciler - annotates pool clusters with the claim that provisioned them.

use crate::config::Config;
use crate::constants::annotations;
use crate::error::{ControllerError, Result};
use crate::kubernetes::objects::patch_params;
use crate::types::{ClusterClaim, ClusterDeployment, ManagedCluster};
use futures::StreamExt;
use kube::{
    api::Patch,
    runtime::{controller::Action, watcher, Controller},
    Api, Client, Resource, ResourceExt,
};
use kube_runtime::controller::Config as ControllerConfig;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct ManagedClusterReconciler {
    client: Client,
    config: Config,
}

impl ManagedClusterReconciler {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let clusters: Api<ManagedCluster> = Api::all(self.client.clone());
        let context = Arc::new(self);

        Controller::new(clusters, watcher::Config::default())
            .with_config(ControllerConfig::default().concurrency(1))
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled managed cluster: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

/// Provisioner annotation value: `<name>.<namespace>.<kind>.<apiVersion>`
pub fn provisioner_for(claim_name: &str, claim_namespace: &str) -> String {
    format!(
        "{}.{}.{}.{}",
        claim_name,
        claim_namespace,
        ClusterClaim::kind(&()),
        ClusterClaim::api_version(&())
    )
}

pub async fn reconcile(
    cluster: Arc<ManagedCluster>,
    ctx: Arc<ManagedClusterReconciler>,
) -> Result<Action> {
    let name = cluster.name_any();
    let clusters: Api<ManagedCluster> = Api::all(ctx.client.clone());

    let Some(cluster) = clusters.get_opt(&name).await? else {
        debug!("ManagedCluster {} not found", name);
        return Ok(Action::await_change());
    };

    if cluster.metadata.deletion_timestamp.is_some() {
        debug!("ManagedCluster {} is being deleted", name);
        return Ok(Action::await_change());
    }

    let deployments: Api<ClusterDeployment> = Api::namespaced(ctx.client.clone(), &name);
    let Some(deployment) = deployments.get_opt(&name).await? else {
        debug!("No ClusterDeployment {}/{}", name, name);
        return Ok(Action::await_change());
    };

    // Only clusters that came out of a pool and have been claimed carry a provisioner
    let Some((claim_name, claim_namespace)) = deployment
        .spec
        .cluster_pool_ref
        .as_ref()
        .and_then(|r| Some((r.claim_name.as_deref()?, r.namespace.as_str())))
        .filter(|(claim, _)| !claim.is_empty())
    else {
        return Ok(Action::await_change());
    };

    let claims: Api<ClusterClaim> = Api::namespaced(ctx.client.clone(), claim_namespace);
    if claims.get_opt(claim_name).await?.is_none() {
        debug!("ClusterClaim {}/{} not found", claim_namespace, claim_name);
        return Ok(Action::await_change());
    }

    let expected = provisioner_for(claim_name, claim_namespace);
    if cluster.annotations().get(annotations::PROVISIONER) == Some(&expected) {
        return Ok(Action::await_change());
    }

    // Merge patch without a resourceVersion: only this one annotation is written
    let patch = json!({
        "metadata": {
            "annotations": BTreeMap::from([(annotations::PROVISIONER, &expected)])
        }
    });
    clusters
        .patch(&name, &patch_params(), &Patch::Merge(&patch))
        .await?;
    info!("Set provisioner of ManagedCluster {} to {}", name, expected);

    Ok(Action::await_change())
}

fn error_policy(
    _cluster: Arc<ManagedCluster>,
    error: &ControllerError,
    ctx: Arc<ManagedClusterReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(ctx.config.error_requeue)
}
