// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::labels;
use kube::{api::ObjectMeta, CustomResource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "cluster.open-cluster-management.io",
    version = "v1",
    kind = "ManagedCluster",
    plural = "managedclusters"
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSpec {
    #[serde(default)]
    pub hub_accepts_client: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_duration_seconds: Option<i32>,
}

impl ManagedCluster {
    /// Build the ManagedCluster registered for a fulfilled claim.
    ///
    /// Claim labels are copied, `name` defaults to the claim name, and
    /// `vendor`/`cloud` are always overwritten.
    pub fn for_claim(
        claim_name: &str,
        target: &str,
        claim_labels: &BTreeMap<String, String>,
    ) -> Self {
        let mut new_labels = claim_labels.clone();
        new_labels
            .entry(labels::NAME.to_string())
            .or_insert_with(|| claim_name.to_string());
        new_labels.insert(
            labels::VENDOR.to_string(),
            labels::VENDOR_OPENSHIFT.to_string(),
        );
        new_labels.insert(
            labels::CLOUD.to_string(),
            labels::CLOUD_AUTO_DETECT.to_string(),
        );

        ManagedCluster {
            metadata: ObjectMeta {
                name: Some(target.to_string()),
                labels: Some(new_labels),
                ..Default::default()
            },
            spec: ManagedClusterSpec {
                hub_accepts_client: true,
                lease_duration_seconds: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::ResourceExt;

    #[test]
    fn test_for_claim_forces_vendor_and_cloud() {
        let claim_labels = BTreeMap::from([
            ("usage".to_string(), "production".to_string()),
            ("vendor".to_string(), "Other".to_string()),
            ("cloud".to_string(), "Amazon".to_string()),
        ]);

        let mc = ManagedCluster::for_claim("my-claim", "cluster01", &claim_labels);

        assert_eq!(mc.name_any(), "cluster01");
        assert!(mc.spec.hub_accepts_client);
        let labels = mc.labels();
        assert_eq!(labels["vendor"], "OpenShift");
        assert_eq!(labels["cloud"], "auto-detect");
        assert_eq!(labels["usage"], "production");
        assert_eq!(labels["name"], "my-claim");
    }

    #[test]
    fn test_for_claim_keeps_explicit_name_label() {
        let claim_labels = BTreeMap::from([("name".to_string(), "prod-east".to_string())]);

        let mc = ManagedCluster::for_claim("my-claim", "cluster01", &claim_labels);

        assert_eq!(mc.labels()["name"], "prod-east");
    }

    #[test]
    fn test_serializes_cluster_scoped() {
        let mc = ManagedCluster::for_claim("c", "cluster01", &BTreeMap::new());
        let value = serde_json::to_value(&mc).unwrap();

        assert_eq!(value["apiVersion"], "cluster.open-cluster-management.io/v1");
        assert_eq!(value["kind"], "ManagedCluster");
        assert_eq!(value["spec"]["hubAcceptsClient"], true);
        assert!(value["metadata"].get("namespace").is_none());
    }
}
