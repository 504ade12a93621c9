// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Finalizers owned by the controllers
pub mod finalizers {
    /// Blocks ClusterClaim deletion until its ManagedCluster and addon config are gone
    pub const CLUSTER_CLAIM: &str = "clusterclaims-controller.open-cluster-management.io/cleanup";
    /// Blocks ClusterPool deletion until its unshared secrets are gone
    pub const CLUSTER_POOL: &str = "clusterpools-controller.open-cluster-management.io/cleanup";
}

/// Kubernetes annotation keys
pub mod annotations {
    /// When "false" (any case), no ManagedCluster is created for the claim
    pub const CREATE_MANAGED_CLUSTER: &str =
        "cluster.open-cluster-management.io/createmanagedcluster";
    /// Provenance of a ManagedCluster: `<claim>.<namespace>.<kind>.<apiVersion>`
    pub const PROVISIONER: &str = "cluster.open-cluster-management.io/provisioner";
}

/// Label keys and fixed label values
pub mod labels {
    pub const REGION: &str = "region";
    pub const CLUSTER_SET: &str = "cluster.open-cluster-management.io/clusterset";
    pub const NAME: &str = "name";
    pub const VENDOR: &str = "vendor";
    pub const VENDOR_OPENSHIFT: &str = "OpenShift";
    pub const CLOUD: &str = "cloud";
    pub const CLOUD_AUTO_DETECT: &str = "auto-detect";
}

/// The operator name, used as field manager for patches
pub const OPERATOR_NAME: &str = "clusterclaims-controller";

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRDs
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
