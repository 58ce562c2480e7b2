//! Cluster access for the reconciler.
//!
//! [`ClusterStore`] abstracts the few Kubernetes calls a pass makes so the
//! reconciler can be unit tested against an in-memory store.

use crate::error::ControllerError;
use crds::{Grafana, GrafanaStatus};
use grafana_datasource::{ArtifactKey, StoredArtifact};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client};

/// Kubernetes operations needed by a datasource pass.
#[async_trait::async_trait]
pub trait ClusterStore: Send + Sync {
    /// Fetches the stored artifact, `None` if it does not exist.
    async fn get_artifact(&self, key: &ArtifactKey) -> Result<Option<StoredArtifact>, ControllerError>;

    /// Creates a new artifact.
    async fn create_artifact(&self, key: &ArtifactKey, artifact: StoredArtifact) -> Result<(), ControllerError>;

    /// Replaces the stored artifact wholesale.
    async fn replace_artifact(&self, key: &ArtifactKey, artifact: StoredArtifact) -> Result<(), ControllerError>;

    /// Writes the status of the owning `Grafana` resource.
    async fn patch_grafana_status(&self, namespace: &str, name: &str, status: &GrafanaStatus) -> Result<(), ControllerError>;
}

/// [`ClusterStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Creates a store using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn config_maps(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl ClusterStore for KubeStore {
    async fn get_artifact(&self, key: &ArtifactKey) -> Result<Option<StoredArtifact>, ControllerError> {
        let found = self.config_maps(&key.namespace).get_opt(&key.name).await?;
        Ok(found.map(StoredArtifact::from))
    }

    async fn create_artifact(&self, key: &ArtifactKey, artifact: StoredArtifact) -> Result<(), ControllerError> {
        self.config_maps(&key.namespace)
            .create(&PostParams::default(), &artifact.into_config_map())
            .await?;
        Ok(())
    }

    async fn replace_artifact(&self, key: &ArtifactKey, artifact: StoredArtifact) -> Result<(), ControllerError> {
        // resourceVersion from the read in this pass; a concurrent write yields 409
        self.config_maps(&key.namespace)
            .replace(&key.name, &PostParams::default(), &artifact.into_config_map())
            .await?;
        Ok(())
    }

    async fn patch_grafana_status(&self, namespace: &str, name: &str, status: &GrafanaStatus) -> Result<(), ControllerError> {
        let api: Api<Grafana> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "status": status });
        api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
        Ok(())
    }
}
