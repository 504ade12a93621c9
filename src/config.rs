// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub enable_cluster_claims: bool,
    pub enable_cluster_pools: bool,
    pub enable_managed_clusters: bool,
    /// Delay before a failed reconcile is retried
    pub error_requeue: Duration,
    /// Block startup until the watched CRDs are served
    pub wait_for_crds: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            enable_cluster_claims: true,
            enable_cluster_pools: true,
            enable_managed_clusters: true,
            error_requeue: Duration::from_secs(60),
            wait_for_crds: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let flag = |key: &str, default: bool| -> Result<bool> {
            match lookup(key) {
                Some(v) => v
                    .trim()
                    .to_ascii_lowercase()
                    .parse()
                    .with_context(|| format!("{} must be true or false, got {:?}", key, v)),
                None => Ok(default),
            }
        };

        let error_requeue = match lookup("ERROR_REQUEUE_SECONDS") {
            Some(v) => Duration::from_secs(v.trim().parse().with_context(|| {
                format!("ERROR_REQUEUE_SECONDS must be a number of seconds, got {:?}", v)
            })?),
            None => defaults.error_requeue,
        };

        Ok(Config {
            enable_cluster_claims: flag(
                "ENABLE_CLUSTERCLAIMS_CONTROLLER",
                defaults.enable_cluster_claims,
            )?,
            enable_cluster_pools: flag(
                "ENABLE_CLUSTERPOOLS_CONTROLLER",
                defaults.enable_cluster_pools,
            )?,
            enable_managed_clusters: flag(
                "ENABLE_MANAGEDCLUSTER_CONTROLLER",
                defaults.enable_managed_clusters,
            )?,
            error_requeue,
            wait_for_crds: flag("WAIT_FOR_CRDS", defaults.wait_for_crds)?,
        })
    }
}
