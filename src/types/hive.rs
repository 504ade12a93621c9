// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Hive provisioning resources (`hive.openshift.io/v1`), reduced to the fields the controllers use.

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "hive.openshift.io",
    version = "v1",
    kind = "ClusterClaim",
    plural = "clusterclaims"
)]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct ClusterClaimSpec {
    #[serde(default)]
    pub cluster_pool_name: String,
    /// Name (and namespace) of the cluster assigned to this claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<String>,
}

impl ClusterClaim {
    /// The cluster this claim was fulfilled with, if any
    pub fn target_cluster(&self) -> Option<&str> {
        self.spec.namespace.as_deref().filter(|ns| !ns.is_empty())
    }
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "hive.openshift.io",
    version = "v1",
    kind = "ClusterPool",
    plural = "clusterpools"
)]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPoolSpec {
    #[serde(default)]
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_secret_ref: Option<SecretReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_config_secret_template_ref: Option<SecretReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i32>,
}

impl ClusterPool {
    pub fn pull_secret_name(&self) -> Option<&str> {
        self.spec.pull_secret_ref.as_ref().map(|r| r.name.as_str())
    }

    pub fn install_config_secret_name(&self) -> Option<&str> {
        self.spec
            .install_config_secret_template_ref
            .as_ref()
            .map(|r| r.name.as_str())
    }

    /// Cloud kind and credentials secret name of the pool's platform.
    /// A pool without a platform block yields `(CloudKind::Skip, "")`.
    pub fn provider_credential(&self) -> (CloudKind, &str) {
        let platform = &self.spec.platform;
        if let Some(aws) = &platform.aws {
            (CloudKind::Aws, aws.credentials_secret_ref.name.as_str())
        } else if let Some(gcp) = &platform.gcp {
            (CloudKind::Gcp, gcp.credentials_secret_ref.name.as_str())
        } else if let Some(azure) = &platform.azure {
            (CloudKind::Azure, azure.credentials_secret_ref.name.as_str())
        } else {
            (CloudKind::Skip, "")
        }
    }
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "hive.openshift.io",
    version = "v1",
    kind = "ClusterDeployment",
    plural = "clusterdeployments"
)]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentSpec {
    #[serde(default)]
    pub platform: Platform,
    /// Set when the deployment was created by a ClusterPool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_pool_ref: Option<ClusterPoolReference>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPoolReference {
    pub namespace: String,
    #[serde(default)]
    pub pool_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_name: Option<String>,
}

/// Cloud platform of a pool or deployment. At most one block is set.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws: Option<CloudPlatform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp: Option<CloudPlatform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure: Option<CloudPlatform>,
}

impl Platform {
    pub fn region(&self) -> Option<&str> {
        [&self.aws, &self.gcp, &self.azure]
            .into_iter()
            .find_map(|p| p.as_ref())
            .map(|p| p.region.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloudPlatform {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub credentials_secret_ref: SecretReference,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct SecretReference {
    #[serde(default)]
    pub name: String,
}

impl SecretReference {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloudKind {
    Aws,
    Gcp,
    Azure,
    Skip,
}

impl fmt::Display for CloudKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CloudKind::Aws => "aws",
            CloudKind::Gcp => "gcp",
            CloudKind::Azure => "azure",
            CloudKind::Skip => "skip",
        })
    }
}
