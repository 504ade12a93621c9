// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to watch events.

pub mod cluster_claim;
pub mod cluster_pool;
pub mod managed_cluster;

pub use cluster_claim::ClusterClaimReconciler;
pub use cluster_pool::ClusterPoolReconciler;
pub use managed_cluster::ManagedClusterReconciler;
