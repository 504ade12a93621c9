// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed views of the Hive and Open Cluster Management resources.

pub mod addon_config;
pub mod hive;
pub mod managed_cluster;

pub use addon_config::KlusterletAddonConfig;
pub use hive::{ClusterClaim, ClusterDeployment, ClusterPool};
pub use managed_cluster::ManagedCluster;
