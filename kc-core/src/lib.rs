pub mod compare;
pub mod config;
pub mod constants;
pub mod context;
pub mod discovery;
pub mod errors;
pub mod jsonutils;
pub mod k8s;
pub mod lifecycle;
pub mod logging;
pub mod manifest;
pub mod poll;
pub mod runner;

pub mod prelude {
    pub use k8s_openapi::api::apps::v1 as appsv1;
    pub use k8s_openapi::api::core::v1 as corev1;
    pub use k8s_openapi::api::networking::v1 as networkingv1;
    pub use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
    pub use kube::ResourceExt;
    pub use kube::api::{
        DynamicObject,
        TypeMeta,
    };

    pub use crate::constants::*;
    pub use crate::context::HarnessContext;
    pub use crate::errors::EmptyResult;
    pub use crate::k8s::{
        ClusterClient,
        ClusterError,
        KubeResourceExt,
    };
}
