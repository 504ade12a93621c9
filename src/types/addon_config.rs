// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::labels;
use kube::{api::ObjectMeta, CustomResource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "agent.open-cluster-management.io",
    version = "v1",
    kind = "KlusterletAddonConfig",
    plural = "klusterletaddonconfigs"
)]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct KlusterletAddonConfigSpec {
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub cluster_namespace: String,
    #[serde(default)]
    pub cluster_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub application_manager: AddonAgentConfig,
    #[serde(default)]
    pub cert_policy_controller: AddonAgentConfig,
    #[serde(default)]
    pub iam_policy_controller: AddonAgentConfig,
    #[serde(default)]
    pub policy_controller: AddonAgentConfig,
    #[serde(default)]
    pub search_collector: AddonAgentConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct AddonAgentConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl AddonAgentConfig {
    const ENABLED: AddonAgentConfig = AddonAgentConfig { enabled: true };
}

impl KlusterletAddonConfig {
    /// Addon config for a managed cluster, with every add-on enabled.
    /// Lives in the cluster's own namespace under the cluster's name.
    pub fn for_cluster(target: &str) -> Self {
        KlusterletAddonConfig {
            metadata: ObjectMeta {
                name: Some(target.to_string()),
                namespace: Some(target.to_string()),
                ..Default::default()
            },
            spec: KlusterletAddonConfigSpec {
                cluster_name: target.to_string(),
                cluster_namespace: target.to_string(),
                // Required for the object to be accepted
                cluster_labels: BTreeMap::from([(
                    labels::VENDOR.to_string(),
                    labels::VENDOR_OPENSHIFT.to_string(),
                )]),
                application_manager: AddonAgentConfig::ENABLED,
                cert_policy_controller: AddonAgentConfig::ENABLED,
                iam_policy_controller: AddonAgentConfig::ENABLED,
                policy_controller: AddonAgentConfig::ENABLED,
                search_collector: AddonAgentConfig::ENABLED,
            },
        }
    }
}
