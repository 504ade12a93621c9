// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Existence-aware get and delete helpers

use crate::constants::OPERATOR_NAME;
use crate::error::Result;
use kube::{
    api::{DeleteParams, PatchParams},
    Api, Resource,
};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{info, instrument, warn};

/// Patch parameters recording this operator as field manager
pub fn patch_params() -> PatchParams {
    PatchParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    }
}

/// Whether a Kubernetes API error is a 404
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}

/// Delete an object, treating an already absent object as success.
/// Returns whether a delete was issued against an existing object.
#[instrument(skip(api))]
pub async fn delete_ignoring_not_found<K>(api: &Api<K>, name: &str) -> Result<bool>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(true),
        Err(e) if is_not_found(&e) => {
            warn!("{} {} was not found", K::kind(&()), name);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete an object unless it is absent or already being deleted
#[instrument(skip(api))]
pub async fn delete_unless_terminating<K>(api: &Api<K>, name: &str) -> Result<()>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    let kind = K::kind(&());

    let Some(obj) = api.get_opt(name).await? else {
        warn!("The {} resource {} was not found, can not delete", kind, name);
        return Ok(());
    };

    if obj.meta().deletion_timestamp.is_some() {
        warn!("The {} resource {} is already being deleted", kind, name);
        return Ok(());
    }

    if delete_ignoring_not_found(api, name).await? {
        info!("Deleted {} resource {}", kind, name);
    }
    Ok(())
}
