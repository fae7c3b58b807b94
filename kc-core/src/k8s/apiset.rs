use std::collections::HashMap;
use std::collections::hash_map::Entry;

use kube::api::ApiResource;
use kube::discovery::{
    ApiCapabilities,
    Scope,
};

use crate::k8s::GVK;
use crate::prelude::*;

// A DynamicApiSet caches the ApiResources returned by the k8s server so that we don't have to make
// a "discovery" call against the apiserver every time we poll for an object.
pub struct DynamicApiSet {
    client: kube::Client,
    resources: HashMap<GVK, (ApiResource, ApiCapabilities)>,
    apis: HashMap<GVK, kube::Api<DynamicObject>>,
    namespaced_apis: HashMap<(GVK, String), kube::Api<DynamicObject>>,
}

impl DynamicApiSet {
    pub fn new(client: kube::Client) -> DynamicApiSet {
        DynamicApiSet {
            client,
            resources: HashMap::new(),
            apis: HashMap::new(),
            namespaced_apis: HashMap::new(),
        }
    }

    // Namespaced objects without a namespace fall back to the default namespace of the client
    pub async fn api_for(&mut self, gvk: &GVK, ns: Option<&str>) -> Result<kube::Api<DynamicObject>, kube::Error> {
        let (ar, cap) = self.api_meta_for(gvk).await?.clone();
        let api = match (cap.scope, ns) {
            (Scope::Namespaced, Some(ns)) => match self.namespaced_apis.entry((gvk.clone(), ns.into())) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    let api = kube::Api::namespaced_with(self.client.clone(), &e.key().1, &ar);
                    e.insert(api)
                },
            },
            (Scope::Namespaced, None) => {
                return Ok(kube::Api::default_namespaced_with(self.client.clone(), &ar));
            },
            (Scope::Cluster, _) => match self.apis.entry(gvk.clone()) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => e.insert(kube::Api::all_with(self.client.clone(), &ar)),
            },
        };
        Ok(api.clone())
    }

    async fn api_meta_for(&mut self, gvk: &GVK) -> Result<&(ApiResource, ApiCapabilities), kube::Error> {
        match self.resources.entry(gvk.clone()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let api_meta = kube::discovery::pinned_kind(&self.client, e.key()).await?;
                Ok(e.insert(api_meta))
            },
        }
    }
}
