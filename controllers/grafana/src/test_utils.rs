//! Test utilities for unit testing the reconciler
//!
//! Provides an in-memory [`ClusterStore`] and helpers for building test CRs.

#![cfg(test)]

use crate::error::ControllerError;
use crate::store::ClusterStore;
use crds::{DatasourceJsonData, Grafana, GrafanaDatasource, GrafanaSpec, GrafanaStatus};
use grafana_datasource::{ArtifactKey, StoredArtifact};
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type ObjectId = (String, String);

/// In-memory cluster: ConfigMaps and Grafana statuses keyed by (namespace, name)
#[derive(Clone, Default)]
pub struct MemoryStore {
    config_maps: Arc<Mutex<HashMap<ObjectId, ConfigMap>>>,
    statuses: Arc<Mutex<HashMap<ObjectId, GrafanaStatus>>>,
    writes: Arc<Mutex<usize>>,
    status_patches: Arc<Mutex<usize>>,
    next_version: Arc<Mutex<u64>>,
}

impl MemoryStore {
    /// Stored ConfigMap, if any
    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.config_maps.lock().unwrap().get(&id(namespace, name)).cloned()
    }

    /// Last status written for a Grafana resource
    pub fn status(&self, namespace: &str, name: &str) -> Option<GrafanaStatus> {
        self.statuses.lock().unwrap().get(&id(namespace, name)).cloned()
    }

    /// Number of ConfigMap creates and replaces
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    /// Number of status patches
    pub fn status_patches(&self) -> usize {
        *self.status_patches.lock().unwrap()
    }

    fn store(&self, key: &ArtifactKey, artifact: StoredArtifact) {
        let mut config_map = artifact.into_config_map();
        let mut version = self.next_version.lock().unwrap();
        *version += 1;
        config_map.metadata.resource_version = Some(version.to_string());
        self.config_maps
            .lock()
            .unwrap()
            .insert(id(&key.namespace, &key.name), config_map);
        *self.writes.lock().unwrap() += 1;
    }
}

fn id(namespace: &str, name: &str) -> ObjectId {
    (namespace.to_string(), name.to_string())
}

#[async_trait::async_trait]
impl ClusterStore for MemoryStore {
    async fn get_artifact(&self, key: &ArtifactKey) -> Result<Option<StoredArtifact>, ControllerError> {
        Ok(self.config_map(&key.namespace, &key.name).map(StoredArtifact::from))
    }

    async fn create_artifact(&self, key: &ArtifactKey, artifact: StoredArtifact) -> Result<(), ControllerError> {
        self.store(key, artifact);
        Ok(())
    }

    async fn replace_artifact(&self, key: &ArtifactKey, artifact: StoredArtifact) -> Result<(), ControllerError> {
        self.store(key, artifact);
        Ok(())
    }

    async fn patch_grafana_status(&self, namespace: &str, name: &str, status: &GrafanaStatus) -> Result<(), ControllerError> {
        self.statuses.lock().unwrap().insert(id(namespace, name), status.clone());
        *self.status_patches.lock().unwrap() += 1;
        Ok(())
    }
}

/// Helper to create test Grafana CRD
pub fn create_test_grafana(name: &str, namespace: &str) -> Grafana {
    Grafana {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("{}-uid", name)),
            ..Default::default()
        },
        spec: GrafanaSpec {
            datasource: GrafanaDatasource {
                name: "prometheus".to_string(),
                kind: "prometheus".to_string(),
                access: "proxy".to_string(),
                url: "https://monitoring-prometheus:9090".to_string(),
                is_default: true,
                json_data: DatasourceJsonData {
                    tls_auth: true,
                    tls_auth_with_ca_cert: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        },
        status: None,
    }
}
