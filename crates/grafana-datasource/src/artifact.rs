//! Stored datasource artifact
//!
//! The cluster copy of the datasource document is a `ConfigMap`:
//!
//! - name `grafana-datasource`, in the owning `Grafana` namespace
//! - labels `app=grafana`, `component=grafana`
//! - data key `datasource.yaml` holding the serialized document
//! - annotation `lastConfig` holding the document fingerprint
//!
//! [`StoredArtifact`] wraps that `ConfigMap` and only exposes a way to change
//! the payload and fingerprint together.

use crate::document::AssembledDocument;
use crds::Grafana;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;

/// Fixed name of the datasource `ConfigMap`.
pub const ARTIFACT_NAME: &str = "grafana-datasource";
/// Data key holding the serialized document.
pub const DATASOURCE_FILE: &str = "datasource.yaml";
/// Annotation holding the fingerprint of the stored document.
pub const LAST_CONFIG_ANNOTATION: &str = "lastConfig";

/// Name and namespace addressing the artifact of one owning resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    /// Object name
    pub name: String,
    /// Owner namespace
    pub namespace: String,
}

impl ArtifactKey {
    /// Key of the artifact in `namespace`.
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self {
            name: ARTIFACT_NAME.to_string(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Selects the artifact owned by `owner`.
///
/// `None` when the owner has no namespace, which a namespaced `Grafana`
/// always has once stored.
pub fn datasource_selector(owner: &Grafana) -> Option<ArtifactKey> {
    owner.namespace().map(ArtifactKey::in_namespace)
}

fn artifact_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), "grafana".to_string()),
        ("component".to_string(), "grafana".to_string()),
    ])
}

/// The persisted datasource `ConfigMap`.
#[derive(Clone, PartialEq)]
pub struct StoredArtifact {
    config_map: ConfigMap,
}

impl StoredArtifact {
    /// Builds a new artifact holding `document`.
    pub fn create(key: &ArtifactKey, document: &AssembledDocument) -> Self {
        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some(key.name.clone()),
                namespace: Some(key.namespace.clone()),
                labels: Some(artifact_labels()),
                annotations: Some(BTreeMap::from([(
                    LAST_CONFIG_ANNOTATION.to_string(),
                    document.fingerprint().to_string(),
                )])),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(
                DATASOURCE_FILE.to_string(),
                document.serialized().to_string(),
            )])),
            ..Default::default()
        };
        Self { config_map }
    }

    /// Serialized document currently stored, if any.
    pub fn payload(&self) -> Option<&str> {
        self.config_map.data.as_ref()?.get(DATASOURCE_FILE).map(String::as_str)
    }

    /// Fingerprint recorded in the `lastConfig` annotation, if any.
    pub fn last_config(&self) -> Option<&str> {
        self.config_map
            .metadata
            .annotations
            .as_ref()?
            .get(LAST_CONFIG_ANNOTATION)
            .map(String::as_str)
    }

    /// Object name.
    pub fn name(&self) -> Option<&str> {
        self.config_map.metadata.name.as_deref()
    }

    /// Object namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.config_map.metadata.namespace.as_deref()
    }

    /// Underlying `ConfigMap`.
    pub fn as_config_map(&self) -> &ConfigMap {
        &self.config_map
    }

    /// Unwraps the `ConfigMap` for persisting.
    pub fn into_config_map(self) -> ConfigMap {
        self.config_map
    }

    /// Copy of this artifact with payload and fingerprint replaced by
    /// `document`. Every other field is kept.
    pub(crate) fn with_document(&self, document: &AssembledDocument) -> Self {
        let mut next = self.clone();
        next.config_map
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(LAST_CONFIG_ANNOTATION.to_string(), document.fingerprint().to_string());
        next.config_map
            .data
            .get_or_insert_with(BTreeMap::new)
            .insert(DATASOURCE_FILE.to_string(), document.serialized().to_string());
        next
    }
}

impl From<ConfigMap> for StoredArtifact {
    fn from(config_map: ConfigMap) -> Self {
        Self { config_map }
    }
}

impl From<StoredArtifact> for ConfigMap {
    fn from(artifact: StoredArtifact) -> Self {
        artifact.config_map
    }
}

impl fmt::Debug for StoredArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredArtifact")
            .field("namespace", &self.namespace())
            .field("name", &self.name())
            .field("last_config", &self.last_config())
            .field("payload_len", &self.payload().map(str::len))
            .finish()
    }
}
