// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery, finalizers, and object deletion.

pub mod crd;
pub mod finalizer;
pub mod objects;

pub use crd::wait_for_crds;
