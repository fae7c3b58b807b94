use std::collections::BTreeMap;
use std::fs;
use std::path::{
    Path,
    PathBuf,
};

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::*;
use crate::k8s::is_cluster_scoped;
use crate::prelude::*;

/// A transformation applied to every resource in a manifest before it is sent to the cluster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transformer {
    InjectNamespace(String),
    InjectLabels(BTreeMap<String, String>),
}

impl Transformer {
    fn apply(&self, obj: &mut DynamicObject) -> EmptyResult {
        match self {
            Transformer::InjectNamespace(ns) => inject_namespace(obj, ns),
            Transformer::InjectLabels(labels) => {
                obj.labels_mut().extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));
                Ok(())
            },
        }
    }
}

/// A parsed, ordered set of resources loaded from a single (possibly multi-document) YAML file.
#[derive(Clone, Debug)]
pub struct Manifest {
    source: PathBuf,
    resources: Vec<DynamicObject>,
}

impl Manifest {
    pub fn from_path(path: &Path) -> anyhow::Result<Manifest> {
        let contents = fs::read_to_string(path).with_context(|| format!("could not read manifest {}", path.display()))?;
        Manifest::parse(path, &contents)
    }

    pub fn from_objects(source: &Path, resources: Vec<DynamicObject>) -> Manifest {
        Manifest { source: source.into(), resources }
    }

    pub fn parse(source: &Path, contents: &str) -> anyhow::Result<Manifest> {
        let mut resources = vec![];
        for (i, doc) in serde_yaml::Deserializer::from_str(contents).enumerate() {
            let value = serde_yaml::Value::deserialize(doc)
                .with_context(|| format!("malformed YAML in document {i} of {}", source.display()))?;

            // Skip documents that are empty or only contain comments, e.g., a trailing "---"
            if value.is_null() {
                continue;
            }

            let obj: DynamicObject = serde_yaml::from_value(value)
                .with_context(|| format!("document {i} of {} is not a kubernetes object", source.display()))?;
            if obj.types.is_none() {
                bail!(HarnessError::missing_type_info(&format!("document {i} of {}", source.display())));
            }
            resources.push(obj);
        }

        Ok(Manifest { source: source.into(), resources })
    }

    pub fn transform(&self, transformers: &[Transformer]) -> anyhow::Result<Manifest> {
        let mut resources = self.resources.clone();
        for obj in resources.iter_mut() {
            for t in transformers {
                t.apply(obj)?;
            }
        }
        Ok(Manifest { source: self.source.clone(), resources })
    }

    pub fn resources(&self) -> &[DynamicObject] {
        &self.resources
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

fn inject_namespace(obj: &mut DynamicObject, ns: &str) -> EmptyResult {
    if !is_cluster_scoped(obj) {
        obj.metadata.namespace = Some(ns.into());
    }

    // Bindings that grant permissions to service accounts have to point at the service accounts
    // in the injected namespace, too
    let kind = obj.types.as_ref().map(|tm| tm.kind.as_str());
    if matches!(kind, Some(ROLE_BINDING_KIND | CLUSTER_ROLE_BINDING_KIND))
        && let Some(subjects) = obj.data.get_mut("subjects").and_then(Value::as_array_mut)
    {
        for subject in subjects.iter_mut().filter(|s| s["kind"] == SVC_ACCOUNT_KIND) {
            let Some(subject) = subject.as_object_mut() else {
                bail!("malformed subject in {}", obj.metadata.name.as_deref().unwrap_or_default());
            };
            subject.insert("namespace".into(), ns.into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::*;
    use serde_json::json;

    use super::*;

    const MULTI_DOC: &str = r#"
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: cm-one
data:
  foo: bar
---
# nothing to see here
---
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRoleBinding
metadata:
  name: the-binding
roleRef:
  apiGroup: rbac.authorization.k8s.io
  kind: ClusterRole
  name: the-role
subjects:
  - kind: ServiceAccount
    name: the-sa
    namespace: default
  - kind: User
    name: somebody
"#;

    #[fixture]
    fn manifest() -> Manifest {
        Manifest::parse(Path::new("multi.yaml"), MULTI_DOC).unwrap()
    }

    #[rstest]
    fn test_parse_skips_empty_documents(manifest: Manifest) {
        assert_len_eq_x!(manifest.resources(), 2);
        assert_eq!(manifest.resources()[0].name_any(), "cm-one");
        assert_eq!(manifest.resources()[0].data["data"], json!({"foo": "bar"}));
        assert_eq!(manifest.resources()[1].types.as_ref().unwrap().kind, CLUSTER_ROLE_BINDING_KIND);
    }

    #[rstest]
    fn test_parse_empty_file() {
        let manifest = Manifest::parse(Path::new("empty.yaml"), "---\n# just a comment\n").unwrap();
        assert!(manifest.is_empty());
    }

    #[rstest]
    fn test_parse_missing_kind() {
        let err = Manifest::parse(Path::new("bad.yaml"), "metadata:\n  name: foo\n").unwrap_err();
        assert!(matches!(err.downcast_ref::<HarnessError>(), Some(HarnessError::MissingTypeInfo(_))));
    }

    #[rstest]
    fn test_parse_malformed_yaml() {
        assert_err!(Manifest::parse(Path::new("bad.yaml"), "kind: [unclosed\n"));
    }

    #[rstest]
    fn test_inject_namespace(manifest: Manifest) {
        let transformed = manifest
            .transform(&[Transformer::InjectNamespace("test-ns".into())])
            .unwrap();

        let cm = &transformed.resources()[0];
        assert_eq!(cm.namespace().as_deref(), Some("test-ns"));

        let crb = &transformed.resources()[1];
        assert_none!(crb.namespace());
        assert_eq!(crb.data["subjects"][0]["namespace"], "test-ns");
        assert_eq!(crb.data["subjects"][1].get("namespace"), None);

        // the original is left alone
        assert_none!(manifest.resources()[0].namespace());
    }

    #[rstest]
    fn test_inject_labels(manifest: Manifest) {
        let labels = BTreeMap::from([(APP_KUBERNETES_IO_MANAGED_BY_KEY.to_string(), "kubecase".to_string())]);
        let transformed = manifest.transform(&[Transformer::InjectLabels(labels.clone())]).unwrap();

        for obj in transformed.resources() {
            assert_eq!(obj.labels(), &labels);
        }
    }
}
