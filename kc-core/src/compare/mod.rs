mod procs;

use std::collections::BTreeMap; // BTreeMap sorts by key, HashMap doesn't
use std::path::Path;

use tracing::*;

pub use self::procs::*;
use crate::errors::*;
use crate::k8s::dyn_obj_kind;
use crate::lifecycle::{
    load_nonempty,
    wait_until_present,
};
use crate::prelude::*;

/// A comparison procedure returns Ok(true) if `actual` matches `expected`, Ok(false) if it doesn't,
/// and an error if the expected object can't be interpreted.
pub type ComparisonProc = fn(&DynamicObject, &DynamicObject) -> anyhow::Result<bool>;

/// The dispatch table from resource kind to comparison procedure.  Build it once at startup; it's
/// read-only while tests are running.
#[derive(Clone)]
pub struct ComparisonStore {
    procs: BTreeMap<String, ComparisonProc>,
}

impl ComparisonStore {
    pub fn empty() -> ComparisonStore {
        ComparisonStore { procs: BTreeMap::new() }
    }

    pub fn register(&mut self, kind: &str, compare_fn: ComparisonProc) -> &mut Self {
        if self.procs.insert(kind.into(), compare_fn).is_some() {
            warn!("replacing comparison procedure for {kind}");
        }
        self
    }

    pub fn lookup(&self, kind: &str) -> anyhow::Result<ComparisonProc> {
        self.procs
            .get(kind)
            .copied()
            .ok_or_else(|| HarnessError::unregistered_kind(kind))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.procs.keys().map(String::as_str)
    }
}

impl Default for ComparisonStore {
    fn default() -> Self {
        let mut store = ComparisonStore::empty();
        store
            .register(CONFIGMAP_KIND, compare_config_maps)
            .register(DEPLOYMENT_KIND, compare_deployments)
            .register(NETWORK_POLICY_KIND, compare_network_policies)
            .register(SECRET_KIND, compare_secrets)
            .register(SERVICE_KIND, compare_services)
            .register(SVC_ACCOUNT_KIND, compare_service_accounts);
        store
    }
}

/// Compare the resources in the manifest at `path` against their counterparts on the cluster,
/// waiting for each one to show up first.  Procedures are looked up by the *expected* object's
/// kind; all of them are resolved before talking to the cluster, so a fixture with an unregistered
/// kind fails without waiting.
#[instrument(skip_all, fields(ns = %ctx.namespace, path = %path.display()))]
pub async fn compare(ctx: &HarnessContext, path: &Path) -> EmptyResult {
    let manifest = load_nonempty(ctx, path)?;
    let procs = manifest
        .resources()
        .iter()
        .map(|obj| ctx.comparators.lookup(dyn_obj_kind(obj)?))
        .collect::<anyhow::Result<Vec<_>>>()?;

    for (expected, compare_fn) in manifest.resources().iter().zip(procs) {
        let actual = wait_until_present(ctx, expected).await?;
        let matched = compare_fn(expected, &actual).map_err(|e| {
            e.context(format!("could not compare {}", expected.namespaced_name()))
        })?;

        if !matched {
            bail!(HarnessError::resource_mismatch(&format!(
                "{} {} (from {})",
                dyn_obj_kind(expected)?,
                expected.namespaced_name(),
                path.display(),
            )));
        }
        debug!("{} matches", expected.namespaced_name());
    }

    Ok(())
}
