use async_trait::async_trait;
use either::Either;
use kube::api::{
    DeleteParams,
    Patch,
    PatchParams,
};
use tokio::sync::Mutex;
use tracing::*;

use super::*;

// ClusterClient implementation that talks to a real apiserver.  Objects are applied with
// server-side apply; discovery results are cached for the lifetime of the client.
pub struct KubeClusterClient {
    apiset: Mutex<DynamicApiSet>,
    field_manager: String,
}

impl KubeClusterClient {
    pub fn new(client: kube::Client, field_manager: &str) -> KubeClusterClient {
        KubeClusterClient {
            apiset: Mutex::new(DynamicApiSet::new(client)),
            field_manager: field_manager.into(),
        }
    }

    async fn api_for_obj(&self, obj: &DynamicObject) -> Result<kube::Api<DynamicObject>, ClusterError> {
        let gvk = GVK::from_dynamic_obj(obj).map_err(|e| ClusterError::Terminal(e.to_string()))?;
        let mut apiset = self.apiset.lock().await;
        Ok(apiset.api_for(&gvk, obj.metadata.namespace.as_deref()).await?)
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get(&self, obj: &DynamicObject) -> Result<DynamicObject, ClusterError> {
        let api = self.api_for_obj(obj).await?;
        Ok(api.get(&obj.name_any()).await?)
    }

    async fn apply(&self, manifest: &Manifest) -> Result<(), ClusterError> {
        let params = PatchParams::apply(&self.field_manager).force();
        for obj in manifest.resources() {
            info!("applying {} {}", dyn_obj_type_str(obj), obj.namespaced_name());
            let api = self.api_for_obj(obj).await?;
            api.patch(&obj.name_any(), &params, &Patch::Apply(obj)).await?;
        }
        Ok(())
    }

    async fn delete(&self, manifest: &Manifest) -> Result<(), ClusterError> {
        for obj in manifest.resources().iter().rev() {
            info!("deleting {} {}", dyn_obj_type_str(obj), obj.namespaced_name());
            let api = self.api_for_obj(obj).await?;

            // delete returns an "either" object; left contains the object being deleted,
            // and right contains a status code indicating the delete is finished.
            match api.delete(&obj.name_any(), &DeleteParams::default()).await.map_err(ClusterError::from) {
                Ok(Either::Left(_)) => debug!("deletion of {} in progress", obj.namespaced_name()),
                Ok(Either::Right(_)) => debug!("{} deleted", obj.namespaced_name()),
                // Deleting something that's already gone is fine
                Err(ClusterError::NotFound(_)) => debug!("{} was already absent", obj.namespaced_name()),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
