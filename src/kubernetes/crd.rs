// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::config::Config;
use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use crate::types::{
    ClusterClaim, ClusterDeployment, ClusterPool, KlusterletAddonConfig, ManagedCluster,
};
use kube::{core::GroupVersionKind, discovery::Discovery, Client, Resource};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

fn gvk<K: Resource<DynamicType = ()>>() -> GroupVersionKind {
    GroupVersionKind::gvk(&K::group(&()), &K::version(&()), &K::kind(&()))
}

/// Kinds that must be served before the enabled controllers can start
pub fn required_kinds(config: &Config) -> Vec<GroupVersionKind> {
    let mut kinds: Vec<GroupVersionKind> = Vec::new();
    let mut require = |gvk: GroupVersionKind| {
        if !kinds.contains(&gvk) {
            kinds.push(gvk);
        }
    };

    if config.enable_cluster_claims {
        require(gvk::<ClusterClaim>());
        require(gvk::<ClusterPool>());
        require(gvk::<ClusterDeployment>());
        require(gvk::<ManagedCluster>());
        require(gvk::<KlusterletAddonConfig>());
    }
    if config.enable_cluster_pools {
        require(gvk::<ClusterPool>());
    }
    if config.enable_managed_clusters {
        require(gvk::<ManagedCluster>());
        require(gvk::<ClusterDeployment>());
        require(gvk::<ClusterClaim>());
    }

    kinds
}

/// Wait for the CRDs of all enabled controllers to become available.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_crds(client: &Client, config: &Config) -> Result<()> {
    let required = required_kinds(config);
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match missing_kinds(client, &required).await {
            Ok(missing) if missing.is_empty() => {
                info!("All {} required CRDs are available", required.len());
                return Ok(());
            }
            Ok(missing) => {
                let names: Vec<String> = missing
                    .iter()
                    .map(|gvk| format!("{} ({}/{})", gvk.kind, gvk.group, gvk.version))
                    .collect();
                info!(
                    "CRDs not yet available: {}, waiting {} seconds...",
                    names.join(", "),
                    interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for CRDs: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        // Exponential backoff with max cap
        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Discover the required API groups and return the kinds that are not served.
async fn missing_kinds<'a>(
    client: &Client,
    required: &'a [GroupVersionKind],
) -> Result<Vec<&'a GroupVersionKind>> {
    let mut groups: Vec<&str> = required.iter().map(|gvk| gvk.group.as_str()).collect();
    groups.sort_unstable();
    groups.dedup();

    let discovery = Discovery::new(client.clone()).filter(&groups).run().await?;

    Ok(required
        .iter()
        .filter(|gvk| {
            !discovery.groups().any(|group| {
                group.name() == gvk.group
                    && group
                        .recommended_resources()
                        .iter()
                        .any(|(ar, _)| ar.kind == gvk.kind && ar.version == gvk.version)
            })
        })
        .collect())
}
