use kube::api::Resource;

use super::*;

pub fn dyn_obj_type_str(obj: &DynamicObject) -> String {
    obj.types
        .as_ref()
        .map(|tm| format!("{}.{}", tm.api_version, tm.kind))
        .unwrap_or("<unknown type>".into())
}

pub fn dyn_obj_kind(obj: &DynamicObject) -> anyhow::Result<&str> {
    match &obj.types {
        Some(tm) if !tm.kind.is_empty() => Ok(&tm.kind),
        _ => bail!(HarnessError::missing_type_info(&obj.namespaced_name())),
    }
}

pub fn is_cluster_scoped(obj: &DynamicObject) -> bool {
    obj.types
        .as_ref()
        .is_some_and(|tm| CLUSTER_SCOPED_KINDS.contains(tm.kind.as_str()))
}

impl<T: Resource> KubeResourceExt for T {
    fn namespaced_name(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{}/{}", ns, self.name_any()),
            None => self.name_any(),
        }
    }
}
