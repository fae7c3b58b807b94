use std::collections::BTreeMap;

use k8s_openapi::ByteString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::*;

use crate::errors::*;
use crate::jsonutils::first_mismatch;
use crate::prelude::*;

// Every procedure here takes (expected, actual) and returns Ok(false) for a mismatch, including
// a mismatch in kind or identity.  Errors are reserved for expected objects that can't be
// interpreted at all, which means the fixture is broken.

pub fn compare_config_maps(expected: &DynamicObject, actual: &DynamicObject) -> anyhow::Result<bool> {
    let Some((e, a)) = parse_pair::<corev1::ConfigMap>(expected, actual)? else {
        return Ok(false);
    };

    Ok(check_eq(expected, "/data", &e.data.unwrap_or_default(), &a.data.unwrap_or_default())
        && check_eq(expected, "/binaryData", &e.binary_data.unwrap_or_default(), &a.binary_data.unwrap_or_default()))
}

// Secrets can be specified with stringData, which the apiserver folds into data; every key in the
// expected secret must be present in the actual secret with the same value, but controllers are
// free to add extra keys.
pub fn compare_secrets(expected: &DynamicObject, actual: &DynamicObject) -> anyhow::Result<bool> {
    let Some((e, a)) = parse_pair::<corev1::Secret>(expected, actual)? else {
        return Ok(false);
    };

    let mut expected_data = e.data.unwrap_or_default();
    for (k, v) in e.string_data.unwrap_or_default() {
        expected_data.insert(k, ByteString(v.into_bytes()));
    }
    let actual_data = a.data.unwrap_or_default();

    if e.type_.is_some() && e.type_ != a.type_ {
        return Ok(mismatch(expected, "/type"));
    }

    for (k, v) in &expected_data {
        if actual_data.get(k) != Some(v) {
            // Don't log the values, they're secret
            return Ok(mismatch(expected, &format!("/data/{k}")));
        }
    }
    Ok(true)
}

pub fn compare_deployments(expected: &DynamicObject, actual: &DynamicObject) -> anyhow::Result<bool> {
    let Some((e, a)) = parse_pair::<appsv1::Deployment>(expected, actual)? else {
        return Ok(false);
    };

    let Some(e_spec) = e.spec else {
        bail!("expected deployment {} has no spec", expected.namespaced_name());
    };
    let Some(a_spec) = a.spec else {
        return Ok(mismatch(expected, "/spec"));
    };

    if e_spec.replicas.is_some() && e_spec.replicas != a_spec.replicas {
        return Ok(mismatch(expected, "/spec/replicas"));
    }

    if !check_subset(expected, "/spec/selector", &e_spec.selector, &a_spec.selector)?
        || !check_subset(expected, "/spec/template/metadata", &e_spec.template.metadata, &a_spec.template.metadata)?
    {
        return Ok(false);
    }

    let (Some(mut e_pod), Some(mut a_pod)) = (e_spec.template.spec, a_spec.template.spec) else {
        return Ok(mismatch(expected, "/spec/template/spec"));
    };

    // Containers are matched up by name, since controllers and the apiserver don't necessarily
    // preserve their order
    let e_containers = std::mem::take(&mut e_pod.containers);
    let a_containers: BTreeMap<_, _> =
        std::mem::take(&mut a_pod.containers).into_iter().map(|c| (c.name.clone(), c)).collect();
    if e_containers.len() != a_containers.len() {
        return Ok(mismatch(expected, "/spec/template/spec/containers"));
    }

    for container in &e_containers {
        let ptr = format!("/spec/template/spec/containers/{}", container.name);
        match a_containers.get(&container.name) {
            Some(actual_container) if check_subset(expected, &ptr, container, actual_container)? => (),
            Some(_) => return Ok(false),
            None => return Ok(mismatch(expected, &ptr)),
        }
    }

    check_subset(expected, "/spec/template/spec", &e_pod, &a_pod)
}

pub fn compare_services(expected: &DynamicObject, actual: &DynamicObject) -> anyhow::Result<bool> {
    let Some((e, a)) = parse_pair::<corev1::Service>(expected, actual)? else {
        return Ok(false);
    };
    check_subset(expected, "/spec", &e.spec, &a.spec)
}

pub fn compare_service_accounts(expected: &DynamicObject, actual: &DynamicObject) -> anyhow::Result<bool> {
    Ok(parse_pair::<corev1::ServiceAccount>(expected, actual)?.is_some())
}

pub fn compare_network_policies(expected: &DynamicObject, actual: &DynamicObject) -> anyhow::Result<bool> {
    let Some((e, a)) = parse_pair::<networkingv1::NetworkPolicy>(expected, actual)? else {
        return Ok(false);
    };
    check_subset(expected, "/spec", &e.spec, &a.spec)
}

/// Generic procedure for kinds without a dedicated comparison: every field present in the expected
/// object must be present and equal in the actual object.  Not registered by default; register it
/// explicitly for any custom resource kinds your fixtures use.
pub fn compare_subset(expected: &DynamicObject, actual: &DynamicObject) -> anyhow::Result<bool> {
    if !metadata_matches(expected, actual) {
        return Ok(false);
    }

    match first_mismatch(&expected.data, &actual.data) {
        Some(ptr) => Ok(mismatch(expected, &ptr)),
        None => Ok(true),
    }
}

// Returns None if the actual object is a different kind/name/namespace than expected, or is
// missing some of the expected labels; otherwise parses both objects into their typed form.
fn parse_pair<K: kube::Resource + DeserializeOwned>(
    expected: &DynamicObject,
    actual: &DynamicObject,
) -> anyhow::Result<Option<(K, K)>> {
    if !metadata_matches(expected, actual) {
        return Ok(None);
    }

    let e = expected.clone().try_parse::<K>()?;
    match actual.clone().try_parse::<K>() {
        Ok(a) => Ok(Some((e, a))),
        Err(err) => {
            info!("could not parse actual object {}: {err}", actual.namespaced_name());
            Ok(None)
        },
    }
}

fn metadata_matches(expected: &DynamicObject, actual: &DynamicObject) -> bool {
    let kind = |obj: &DynamicObject| obj.types.as_ref().map(|tm| tm.kind.clone());
    if kind(expected) != kind(actual) {
        return mismatch(expected, "/kind");
    }

    if expected.name_any() != actual.name_any() {
        return mismatch(expected, "/metadata/name");
    }

    if expected.namespace().is_some() && expected.namespace() != actual.namespace() {
        return mismatch(expected, "/metadata/namespace");
    }

    for (k, v) in expected.labels() {
        if actual.labels().get(k) != Some(v) {
            return mismatch(expected, &format!("/metadata/labels/{k}"));
        }
    }

    true
}

fn check_eq<T: PartialEq>(expected_obj: &DynamicObject, ptr: &str, expected: &T, actual: &T) -> bool {
    expected == actual || mismatch(expected_obj, ptr)
}

fn check_subset<T: Serialize>(expected_obj: &DynamicObject, ptr: &str, expected: &T, actual: &T) -> anyhow::Result<bool> {
    let (e, a): (Value, Value) = (serde_json::to_value(expected)?, serde_json::to_value(actual)?);

    // Nothing specified means anything goes
    if e.is_null() {
        return Ok(true);
    }

    match first_mismatch(&e, &a) {
        None => Ok(true),
        Some(sub) if sub == "/" => Ok(mismatch(expected_obj, ptr)),
        Some(sub) => Ok(mismatch(expected_obj, &format!("{ptr}{sub}"))),
    }
}

// Always returns false so callers can `return mismatch(...)`
fn mismatch(expected: &DynamicObject, ptr: &str) -> bool {
    info!("{} {} does not match at {ptr}", dyn_kind_str(expected), expected.namespaced_name());
    false
}

fn dyn_kind_str(obj: &DynamicObject) -> &str {
    obj.types.as_ref().map_or("<unknown kind>", |tm| tm.kind.as_str())
}
