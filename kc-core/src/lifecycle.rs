use std::path::Path;

use anyhow::Context;
use tracing::*;

use crate::errors::*;
use crate::k8s::dyn_obj_type_str;
use crate::manifest::Manifest;
use crate::poll::{
    ProbeFailure,
    poll_until,
};
use crate::prelude::*;

/// Assert that every resource in the manifest at `path` is (or eventually becomes) absent from the
/// test namespace.
#[instrument(skip_all, fields(ns = %ctx.namespace, path = %path.display()))]
pub async fn assert_absent(ctx: &HarnessContext, path: &Path) -> EmptyResult {
    let manifest = load_nonempty(ctx, path)?;
    for obj in manifest.resources() {
        wait_until_absent(ctx, obj).await?;
    }
    Ok(())
}

/// Apply every resource in the manifest at `path` to the test namespace and wait until all of them
/// can be read back from the cluster.
#[instrument(skip_all, fields(ns = %ctx.namespace, path = %path.display()))]
pub async fn deploy(ctx: &HarnessContext, path: &Path) -> EmptyResult {
    let manifest = load_nonempty(ctx, path)?;
    ctx.client
        .apply(&manifest)
        .await
        .with_context(|| format!("could not apply {}", path.display()))?;

    for obj in manifest.resources() {
        wait_until_present(ctx, obj).await?;
    }
    Ok(())
}

/// Delete every resource in the manifest at `path` from the test namespace and wait until all of
/// them are gone.
#[instrument(skip_all, fields(ns = %ctx.namespace, path = %path.display()))]
pub async fn remove(ctx: &HarnessContext, path: &Path) -> EmptyResult {
    let manifest = load_nonempty(ctx, path)?;
    ctx.client
        .delete(&manifest)
        .await
        .with_context(|| format!("could not delete {}", path.display()))?;

    for obj in manifest.resources() {
        wait_until_absent(ctx, obj).await?;
    }
    Ok(())
}

pub(crate) fn load_nonempty(ctx: &HarnessContext, path: &Path) -> anyhow::Result<Manifest> {
    let manifest = ctx.load_manifest(path)?;
    if manifest.is_empty() {
        bail!(HarnessError::empty_manifest(&manifest.source().display().to_string()));
    }
    Ok(manifest)
}

/// Wait until `obj` can be read back from the cluster, and return what the cluster has.
pub async fn wait_until_present(ctx: &HarnessContext, obj: &DynamicObject) -> anyhow::Result<DynamicObject> {
    let desc = format!("{} {} to exist", dyn_obj_type_str(obj), obj.namespaced_name());
    let client = &ctx.client;
    poll_until(&ctx.poll, &ctx.cancel, &desc, move || async move {
        client.get(obj).await.map_err(ProbeFailure::from)
    })
    .await
}

pub(crate) async fn wait_until_absent(ctx: &HarnessContext, obj: &DynamicObject) -> EmptyResult {
    let desc = format!("{} {} to be absent", dyn_obj_type_str(obj), obj.namespaced_name());
    let client = &ctx.client;
    poll_until(&ctx.poll, &ctx.cancel, &desc, move || async move {
        match client.get(obj).await {
            Ok(_) => Err(ProbeFailure::Retry(HarnessError::resource_still_exists(&obj.namespaced_name()))),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    })
    .await
}
