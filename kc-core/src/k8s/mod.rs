mod apiset;
mod client;
mod gvk;
mod util;

pub use apiset::*;
use async_trait::async_trait;
pub use client::*;
pub use gvk::*;
#[cfg(feature = "mock")]
use mockall::automock;
pub use util::*;

use crate::errors::*;
use crate::manifest::Manifest;
use crate::prelude::*;

// Status codes where retrying the request isn't going to change the answer
const TERMINAL_STATUS_CODES: [u16; 5] = [400, 401, 403, 405, 422];

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ClusterError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("unrecoverable cluster error: {0}")]
    Terminal(String),

    #[error("cluster error: {0}")]
    Transient(String),
}

impl ClusterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ClusterError::Terminal(_))
    }
}

impl From<kube::Error> for ClusterError {
    fn from(err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(resp) if resp.code == 404 => ClusterError::NotFound(resp.message.clone()),
            kube::Error::Api(resp) if TERMINAL_STATUS_CODES.contains(&resp.code) => {
                ClusterError::Terminal(format!("{} ({}): {}", resp.reason, resp.code, resp.message))
            },
            _ => ClusterError::Transient(err.to_string()),
        }
    }
}

/// The minimal set of cluster operations the harness needs.  Implementations must be safe to share
/// across tasks; the harness never holds a lock across calls.
#[cfg_attr(feature = "mock", automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn get(&self, obj: &DynamicObject) -> Result<DynamicObject, ClusterError>;
    async fn apply(&self, manifest: &Manifest) -> Result<(), ClusterError>;
    async fn delete(&self, manifest: &Manifest) -> Result<(), ClusterError>;
}

pub trait KubeResourceExt {
    fn namespaced_name(&self) -> String;
}
