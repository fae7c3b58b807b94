use kc_core::prelude::*;
use kube::discovery::ApiResource;
use rstest::fixture;
use serde_json::json;

use crate::constants::*;

#[fixture]
pub fn test_config_map(#[default(TEST_CONFIG_MAP)] name: &str) -> DynamicObject {
    DynamicObject::new(name, &ApiResource::from_gvk(&CONFIG_MAP_GVK))
        .within(TEST_NAMESPACE)
        .data(json!({"data": {"foo": "bar", "baz": "qux"}}))
}

#[fixture]
pub fn test_secret(#[default(TEST_SECRET)] name: &str) -> DynamicObject {
    DynamicObject::new(name, &ApiResource::from_gvk(&SECRET_GVK))
        .within(TEST_NAMESPACE)
        .data(json!({"type": "Opaque", "data": {"password": "aHVudGVyMg=="}}))
}

#[fixture]
pub fn test_deployment(#[default(TEST_DEPLOYMENT)] name: &str) -> DynamicObject {
    let mut depl = DynamicObject::new(name, &ApiResource::from_gvk(&DEPL_GVK))
        .within(TEST_NAMESPACE)
        .data(json!({
            "spec": {
                "replicas": 2,
                "selector": {"matchLabels": {"app": name}},
                "template": {
                    "metadata": {"labels": {"app": name}},
                    "spec": {
                        "serviceAccountName": TEST_SERVICE_ACCOUNT,
                        "containers": [{
                            "name": "server",
                            "image": "quay.io/example/server:v1",
                            "args": ["--port", "8888"],
                            "ports": [{"containerPort": 8888, "name": "http", "protocol": "TCP"}],
                        }],
                    },
                },
            },
        }));
    depl.labels_mut().insert("app".into(), name.into());
    depl
}

#[fixture]
pub fn test_service(#[default(TEST_SERVICE)] name: &str) -> DynamicObject {
    DynamicObject::new(name, &ApiResource::from_gvk(&SERVICE_GVK))
        .within(TEST_NAMESPACE)
        .data(json!({
            "spec": {
                "selector": {"app": TEST_DEPLOYMENT},
                "ports": [{"name": "http", "port": 8888, "targetPort": 8888, "protocol": "TCP"}],
            },
        }))
}

#[fixture]
pub fn test_service_account(#[default(TEST_SERVICE_ACCOUNT)] name: &str) -> DynamicObject {
    DynamicObject::new(name, &ApiResource::from_gvk(&SVC_ACCOUNT_GVK)).within(TEST_NAMESPACE)
}

#[fixture]
pub fn test_network_policy(#[default("the-netpol")] name: &str) -> DynamicObject {
    DynamicObject::new(name, &ApiResource::from_gvk(&NETPOL_GVK))
        .within(TEST_NAMESPACE)
        .data(json!({
            "spec": {
                "podSelector": {"matchLabels": {"app": TEST_DEPLOYMENT}},
                "policyTypes": ["Ingress"],
                "ingress": [{"ports": [{"port": 8888, "protocol": "TCP"}]}],
            },
        }))
}

#[fixture]
pub fn test_frobnicator() -> DynamicObject {
    DynamicObject {
        types: Some(TypeMeta {
            api_version: "example.com/v1".into(),
            kind: UNREGISTERED_KIND.into(),
        }),
        metadata: metav1::ObjectMeta {
            namespace: Some(TEST_NAMESPACE.into()),
            name: Some("the-frobnicator".into()),
            ..Default::default()
        },
        data: json!({"spec": {"frobs": 3}}),
    }
}

// What the apiserver hands back for an object: the same thing we sent, plus a bunch of
// server-populated fields that the comparison procedures are supposed to ignore.
pub fn as_served(obj: &DynamicObject) -> DynamicObject {
    let mut served = obj.clone();
    served.metadata.uid = Some("b9f2d4c1-0000-4000-8000-123456789abc".into());
    served.metadata.resource_version = Some("12345".into());
    served.metadata.generation = Some(1);
    served
        .annotations_mut()
        .insert("kubectl.kubernetes.io/last-applied-configuration".into(), "{}".into());
    if let Some(data) = served.data.as_object_mut() {
        data.insert("status".into(), json!({"observedGeneration": 1}));
    }
    served
}
