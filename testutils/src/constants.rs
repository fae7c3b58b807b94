use kc_core::k8s::GVK;
use lazy_static::lazy_static;

pub const TEST_NAMESPACE: &str = "test-namespace";
pub const TEST_CONFIG_MAP: &str = "the-config-map";
pub const TEST_DEPLOYMENT: &str = "the-deployment";
pub const TEST_SECRET: &str = "the-secret";
pub const TEST_SERVICE: &str = "the-service";
pub const TEST_SERVICE_ACCOUNT: &str = "the-service-account";

// A kind that nobody registers a comparison procedure for
pub const UNREGISTERED_KIND: &str = "Frobnicator";

pub const CONFIG_MAP_YAML: &str = "
apiVersion: v1
kind: ConfigMap
metadata:
  name: the-config-map
data:
  foo: bar
";

pub const SERVICE_ACCOUNT_YAML: &str = "
apiVersion: v1
kind: ServiceAccount
metadata:
  name: the-service-account
";

pub const FROBNICATOR_YAML: &str = "
apiVersion: example.com/v1
kind: Frobnicator
metadata:
  name: the-frobnicator
spec:
  frobs: 3
";

// The "config" for a case is the custom resource the controller under test reconciles
pub const CONTROLLER_CR_YAML: &str = "
apiVersion: example.com/v1
kind: Pipeline
metadata:
  name: the-pipeline
spec:
  replicas: 2
";

lazy_static! {
    pub static ref CONFIG_MAP_GVK: GVK = GVK::new("", "v1", "ConfigMap");
    pub static ref DEPL_GVK: GVK = GVK::new("apps", "v1", "Deployment");
    pub static ref NAMESPACE_GVK: GVK = GVK::new("", "v1", "Namespace");
    pub static ref NETPOL_GVK: GVK = GVK::new("networking.k8s.io", "v1", "NetworkPolicy");
    pub static ref PIPELINE_GVK: GVK = GVK::new("example.com", "v1", "Pipeline");
    pub static ref SECRET_GVK: GVK = GVK::new("", "v1", "Secret");
    pub static ref SERVICE_GVK: GVK = GVK::new("", "v1", "Service");
    pub static ref SVC_ACCOUNT_GVK: GVK = GVK::new("", "v1", "ServiceAccount");
}
