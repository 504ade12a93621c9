// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ClusterPool reconciler - removes a deleted pool's secrets unless another pool still uses them.

use crate::config::Config;
use crate::constants::finalizers;
use crate::error::{ControllerError, Result};
use crate::kubernetes::finalizer::{add_finalizer, remove_finalizer, FinalizerState};
use crate::kubernetes::objects::delete_ignoring_not_found;
use crate::types::ClusterPool;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::ListParams,
    runtime::{controller::Action, watcher, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::controller::Config as ControllerConfig;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct ClusterPoolReconciler {
    client: Client,
    config: Config,
}

impl ClusterPoolReconciler {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let pools: Api<ClusterPool> = Api::all(self.client.clone());
        let context = Arc::new(self);

        Controller::new(pools, watcher::Config::default())
            .with_config(ControllerConfig::default().concurrency(1))
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled cluster pool: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

pub async fn reconcile(pool: Arc<ClusterPool>, ctx: Arc<ClusterPoolReconciler>) -> Result<Action> {
    let name = pool.name_any();
    let namespace = pool
        .namespace()
        .ok_or(ControllerError::MissingObjectKey(".metadata.namespace"))?;
    let pools: Api<ClusterPool> = Api::namespaced(ctx.client.clone(), &namespace);

    let Some(pool) = pools.get_opt(&name).await? else {
        info!("ClusterPool {}/{} deleted", namespace, name);
        return Ok(Action::await_change());
    };

    match FinalizerState::of(&pool.metadata, finalizers::CLUSTER_POOL) {
        FinalizerState::Finalized => {}
        FinalizerState::Unmanaged => {
            info!("Reconcile cluster pool {}/{}", namespace, name);
            add_finalizer(&pools, &pool, finalizers::CLUSTER_POOL).await?;
        }
        // A pool deleted before it carried our finalizer is still cleaned up
        FinalizerState::Deleting | FinalizerState::Released => {
            info!("Reconcile deleted cluster pool {}/{}", namespace, name);
            delete_unshared_secrets(&ctx.client, &pools, &pool).await?;
            remove_finalizer(&pools, &pool, finalizers::CLUSTER_POOL).await?;
        }
    }

    Ok(Action::await_change())
}

fn error_policy(
    _pool: Arc<ClusterPool>,
    error: &ControllerError,
    ctx: Arc<ClusterPoolReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(ctx.config.error_requeue)
}

/// The secrets a ClusterPool references
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecretRole {
    InstallConfig,
    PullSecret,
    ProviderCredential,
}

impl fmt::Display for SecretRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SecretRole::InstallConfig => "install-config",
            SecretRole::PullSecret => "pull-secret",
            SecretRole::ProviderCredential => "provider-credential",
        })
    }
}

/// Secrets of `pool` that no other pool in `pools` references.
///
/// Sharing is decided by secret name; provider credentials must also match
/// on cloud kind. `pools` may contain `pool` itself, it is skipped by name.
pub fn unshared_secrets<'a>(
    pool: &'a ClusterPool,
    pools: &[ClusterPool],
) -> Vec<(SecretRole, &'a str)> {
    let pool_name = pool.name_any();
    let others: Vec<&ClusterPool> = pools.iter().filter(|p| p.name_any() != pool_name).collect();

    let mut unshared = Vec::new();

    if let Some(secret) = pool.install_config_secret_name().filter(|s| !s.is_empty()) {
        if !others
            .iter()
            .any(|p| p.install_config_secret_name() == Some(secret))
        {
            unshared.push((SecretRole::InstallConfig, secret));
        }
    }

    if let Some(secret) = pool.pull_secret_name().filter(|s| !s.is_empty()) {
        if !others.iter().any(|p| p.pull_secret_name() == Some(secret)) {
            unshared.push((SecretRole::PullSecret, secret));
        }
    }

    let credential = pool.provider_credential();
    debug!("Provider credential {}/{:?}", credential.0, credential.1);
    if !credential.1.is_empty() && !others.iter().any(|p| p.provider_credential() == credential) {
        unshared.push((SecretRole::ProviderCredential, credential.1));
    }

    unshared
}

#[instrument(skip(client, pools, pool), fields(pool = %pool.name_any()))]
async fn delete_unshared_secrets(
    client: &Client,
    pools: &Api<ClusterPool>,
    pool: &ClusterPool,
) -> Result<()> {
    let namespace = pool
        .namespace()
        .ok_or(ControllerError::MissingObjectKey(".metadata.namespace"))?;

    let siblings = pools.list(&ListParams::default()).await?.items;
    let unshared = unshared_secrets(pool, &siblings);

    info!(
        "Unshared secrets of cluster pool {}/{}: {:?}",
        namespace,
        pool.name_any(),
        unshared
    );

    let secrets: Api<Secret> = Api::namespaced(client.clone(), &namespace);
    for (role, secret) in unshared {
        if delete_ignoring_not_found(&secrets, secret).await? {
            info!("Deleted {} secret {}/{}", role, namespace, secret);
        }
    }

    Ok(())
}
