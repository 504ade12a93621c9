// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Finalizer lifecycle of objects whose deletion needs cleanup.
//!
//! An object moves through `Unmanaged -> Finalized -> Deleting -> Released`.
//! Every transition is a single JSON merge patch carrying the object's
//! `resourceVersion`, so a write based on a stale read is rejected with a
//! conflict and the reconcile is retried against fresh state.

use crate::error::Result;
use crate::kubernetes::objects::patch_params;
use kube::{
    api::{ObjectMeta, Patch},
    core::NamespaceResourceScope,
    Api, Resource, ResourceExt,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt::Debug;
use tracing::{debug, info, instrument};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalizerState {
    /// Not deleting and not yet claimed by our finalizer
    Unmanaged,
    /// Not deleting, our finalizer is in place
    Finalized,
    /// Deletion requested, our cleanup has not completed
    Deleting,
    /// Deletion requested and our finalizer is gone; waiting on the API server
    Released,
}

impl FinalizerState {
    pub fn of(meta: &ObjectMeta, finalizer: &str) -> Self {
        let has_finalizer = meta
            .finalizers
            .as_ref()
            .is_some_and(|f| f.iter().any(|x| x == finalizer));

        match (meta.deletion_timestamp.is_some(), has_finalizer) {
            (false, false) => FinalizerState::Unmanaged,
            (false, true) => FinalizerState::Finalized,
            (true, true) => FinalizerState::Deleting,
            (true, false) => FinalizerState::Released,
        }
    }
}

/// Merge patch appending `finalizer`, or `None` when it is already present
pub fn add_finalizer_patch(meta: &ObjectMeta, finalizer: &str) -> Option<Value> {
    let mut finalizers = meta.finalizers.clone().unwrap_or_default();
    if finalizers.iter().any(|f| f == finalizer) {
        return None;
    }
    finalizers.push(finalizer.to_string());
    Some(finalizers_patch(meta, finalizers))
}

/// Merge patch dropping `finalizer`, or `None` when it is already absent
pub fn remove_finalizer_patch(meta: &ObjectMeta, finalizer: &str) -> Option<Value> {
    let finalizers = meta.finalizers.clone().unwrap_or_default();
    if !finalizers.iter().any(|f| f == finalizer) {
        return None;
    }
    let remaining: Vec<String> = finalizers.into_iter().filter(|f| f != finalizer).collect();
    Some(finalizers_patch(meta, remaining))
}

// A merge patch replaces lists wholesale, so the full list is always sent.
fn finalizers_patch(meta: &ObjectMeta, finalizers: Vec<String>) -> Value {
    json!({
        "metadata": {
            "finalizers": finalizers,
            "resourceVersion": meta.resource_version,
        }
    })
}

/// Add `finalizer` to a namespaced resource. No-op if already present.
#[instrument(skip(api, resource), fields(object = %resource.name_any()))]
pub async fn add_finalizer<K>(api: &Api<K>, resource: &K, finalizer: &str) -> Result<()>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let Some(patch) = add_finalizer_patch(resource.meta(), finalizer) else {
        debug!("Finalizer already present");
        return Ok(());
    };

    api.patch(&resource.name_any(), &patch_params(), &Patch::Merge(&patch))
        .await?;
    info!("Added finalizer {} on {}", finalizer, K::kind(&()));
    Ok(())
}

/// Remove `finalizer` from a namespaced resource. No-op if already absent.
#[instrument(skip(api, resource), fields(object = %resource.name_any()))]
pub async fn remove_finalizer<K>(api: &Api<K>, resource: &K, finalizer: &str) -> Result<()>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let Some(patch) = remove_finalizer_patch(resource.meta(), finalizer) else {
        debug!("Finalizer already removed");
        return Ok(());
    };

    api.patch(&resource.name_any(), &patch_params(), &Patch::Merge(&patch))
        .await?;
    info!("Removed finalizer {} on {}", finalizer, K::kind(&()));
    Ok(())
}
