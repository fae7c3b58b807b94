use std::collections::HashSet;

use lazy_static::lazy_static;

// Fixture layout
pub const DEFAULT_CASES_DIR: &str = "./testdata/declarative";
pub const CASE_DEPLOY_DIR: &str = "deploy";
pub const CASE_CREATED_DIR: &str = "expected/created";
pub const CASE_NOT_CREATED_DIR: &str = "expected/not_created";
pub const CASE_CONFIG_FILE: &str = "config.yaml";

// Defaults
pub const DEFAULT_FIELD_MANAGER: &str = "kubecase";
pub const DEFAULT_NAMESPACE_PREFIX: &str = "kc-test";

// Namespace names are DNS-1123 labels
pub const MAX_NAMESPACE_LEN: usize = 63;

// Timing
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2;

// Well-known labels
pub const APP_KUBERNETES_IO_MANAGED_BY_KEY: &str = "app.kubernetes.io/managed-by";

// Kinds
pub const CONFIGMAP_KIND: &str = "ConfigMap";
pub const DEPLOYMENT_KIND: &str = "Deployment";
pub const NAMESPACE_KIND: &str = "Namespace";
pub const NETWORK_POLICY_KIND: &str = "NetworkPolicy";
pub const SECRET_KIND: &str = "Secret";
pub const SERVICE_KIND: &str = "Service";
pub const SVC_ACCOUNT_KIND: &str = "ServiceAccount";

// Kinds that get their subjects' namespaces rewritten on namespace injection
pub const ROLE_BINDING_KIND: &str = "RoleBinding";
pub const CLUSTER_ROLE_BINDING_KIND: &str = "ClusterRoleBinding";

lazy_static! {
    // Built-in cluster-scoped kinds never get a namespace injected
    pub static ref CLUSTER_SCOPED_KINDS: HashSet<&'static str> = HashSet::from([
        "APIService",
        "ClusterRole",
        CLUSTER_ROLE_BINDING_KIND,
        "CustomResourceDefinition",
        "MutatingWebhookConfiguration",
        NAMESPACE_KIND,
        "Node",
        "PersistentVolume",
        "PriorityClass",
        "StorageClass",
        "ValidatingWebhookConfiguration",
    ]);
}
