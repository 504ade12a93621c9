// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: an in-memory Kubernetes API server behind a kube Client.

use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::{Client, Resource};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

const DELETION_TIMESTAMP: &str = "2026-01-01T00:00:00Z";

/// A fake API server that stores objects by URL path.
///
/// Supports get, list, create, JSON merge patch and delete. It honours
/// `metadata.resourceVersion` preconditions in patches, marks objects with
/// finalizers as deleting instead of removing them, and removes deleting
/// objects once their last finalizer is patched away.
#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<String, Value>,
    failures: HashMap<(String, String), u16>,
    requests: Vec<(String, String)>,
    resource_version: u64,
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object
    pub fn with<K>(self, obj: &K) -> Self
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let meta = obj.meta();
        let path = object_path::<K>(
            meta.namespace.as_deref(),
            meta.name.as_deref().unwrap_or_default(),
        );
        let value = serde_json::to_value(obj).expect("serializable object");
        {
            let mut state = self.state.lock().unwrap();
            state.store(path, value);
        }
        self
    }

    /// Mark a seeded object as being deleted
    pub fn deleting<K>(self, namespace: Option<&str>, name: &str) -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        let path = object_path::<K>(namespace, name);
        {
            let mut state = self.state.lock().unwrap();
            let obj = state.objects.get_mut(&path).expect("seeded object");
            obj["metadata"]["deletionTimestamp"] = json!(DELETION_TIMESTAMP);
        }
        self
    }

    /// Answer every `method` request on exactly `path` with an error status
    pub fn fail(self, method: &str, path: &str, status: u16) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((method.to_string(), path.to_string()), status);
        self
    }

    /// Build a kube Client backed by this server
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    /// Read back a stored object
    pub fn get<K>(&self, namespace: Option<&str>, name: &str) -> Option<K>
    where
        K: Resource<DynamicType = ()> + DeserializeOwned,
    {
        let path = object_path::<K>(namespace, name);
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&path)
            .map(|v| serde_json::from_value(v.clone()).expect("stored object deserializes"))
    }

    /// All requests seen so far as (method, path)
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of requests seen with `method`
    pub fn count(&self, method: &str) -> usize {
        self.requests().iter().filter(|(m, _)| m == method).count()
    }

    /// Forget recorded requests
    pub fn reset_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }
}

fn object_path<K: Resource<DynamicType = ()>>(namespace: Option<&str>, name: &str) -> String {
    format!("{}/{}", K::url_path(&(), namespace), name)
}

/// Collection paths have an odd number of segments after the group/version prefix
fn is_collection(path: &str) -> bool {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let prefix = if segments.first() == Some(&"api") { 2 } else { 3 };
    segments.len().saturating_sub(prefix) % 2 == 1
}

fn status(code: u16, reason: &str, message: String) -> (u16, Value) {
    (
        code,
        json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": message,
            "reason": reason,
            "code": code
        }),
    )
}

fn not_found(path: &str) -> (u16, Value) {
    status(404, "NotFound", format!("{} not found", path))
}

fn has_finalizers(obj: &Value) -> bool {
    obj["metadata"]["finalizers"]
        .as_array()
        .is_some_and(|f| !f.is_empty())
}

fn is_deleting(obj: &Value) -> bool {
    obj["metadata"]["deletionTimestamp"].is_string()
}

impl State {
    fn store(&mut self, path: String, mut obj: Value) -> Value {
        self.resource_version += 1;
        obj["metadata"]["resourceVersion"] = json!(self.resource_version.to_string());
        self.objects.insert(path, obj.clone());
        obj
    }

    fn handle(&mut self, method: &str, path: &str, body: &[u8]) -> (u16, Value) {
        self.requests.push((method.to_string(), path.to_string()));

        if let Some(code) = self.failures.get(&(method.to_string(), path.to_string())) {
            return status(*code, "InternalError", format!("injected failure on {}", path));
        }

        match method {
            "GET" if is_collection(path) => {
                let items: Vec<Value> = self
                    .objects
                    .iter()
                    .filter(|(key, _)| {
                        key.rsplit_once('/')
                            .is_some_and(|(parent, _)| parent == path)
                    })
                    .map(|(_, obj)| obj.clone())
                    .collect();
                (
                    200,
                    json!({
                        "apiVersion": "v1",
                        "kind": "List",
                        "metadata": { "resourceVersion": self.resource_version.to_string() },
                        "items": items
                    }),
                )
            }
            "GET" => match self.objects.get(path) {
                Some(obj) => (200, obj.clone()),
                None => not_found(path),
            },
            "POST" => {
                let Ok(obj) = serde_json::from_slice::<Value>(body) else {
                    return status(400, "BadRequest", "invalid body".to_string());
                };
                let Some(name) = obj["metadata"]["name"].as_str() else {
                    return status(422, "Invalid", "name is required".to_string());
                };
                let key = format!("{}/{}", path, name);
                if self.objects.contains_key(&key) {
                    return status(409, "AlreadyExists", format!("{} already exists", key));
                }
                (201, self.store(key, obj))
            }
            "PATCH" => {
                let Some(current) = self.objects.get(path).cloned() else {
                    return not_found(path);
                };
                let Ok(patch) = serde_json::from_slice::<Value>(body) else {
                    return status(400, "BadRequest", "invalid patch".to_string());
                };
                if let Some(expected) = patch["metadata"]["resourceVersion"].as_str() {
                    if current["metadata"]["resourceVersion"].as_str() != Some(expected) {
                        return status(409, "Conflict", format!("{} has been modified", path));
                    }
                }
                let mut updated = current;
                json_patch::merge(&mut updated, &patch);
                let updated = self.store(path.to_string(), updated);
                if is_deleting(&updated) && !has_finalizers(&updated) {
                    self.objects.remove(path);
                }
                (200, updated)
            }
            "DELETE" => {
                let Some(mut obj) = self.objects.get(path).cloned() else {
                    return not_found(path);
                };
                if has_finalizers(&obj) {
                    if !is_deleting(&obj) {
                        obj["metadata"]["deletionTimestamp"] = json!(DELETION_TIMESTAMP);
                        obj = self.store(path.to_string(), obj);
                    }
                } else {
                    self.objects.remove(path);
                }
                (200, obj)
            }
            _ => status(405, "MethodNotAllowed", format!("{} not supported", method)),
        }
    }
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = self.state.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let bytes = body.collect().await?.to_bytes();
            let method = parts.method.to_string();
            let path = parts.uri.path().to_string();

            let (code, value) = state.lock().unwrap().handle(&method, &path, &bytes);

            Ok(Response::builder()
                .status(code)
                .header("content-type", "application/json")
                .body(Body::from(value.to_string().into_bytes()))
                .unwrap())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_collection() {
        assert!(is_collection("/api/v1/namespaces/ns/secrets"));
        assert!(!is_collection("/api/v1/namespaces/ns/secrets/pull"));
        assert!(is_collection("/apis/cluster.open-cluster-management.io/v1/managedclusters"));
        assert!(!is_collection(
            "/apis/cluster.open-cluster-management.io/v1/managedclusters/c1"
        ));
        assert!(is_collection("/apis/hive.openshift.io/v1/namespaces/ns/clusterpools"));
    }
}
