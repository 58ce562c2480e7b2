//! Controller-specific error types.
//!
//! Wraps Kubernetes API and datasource assembly failures so the controller's
//! error policy can requeue them uniformly.

use grafana_datasource::DatasourceError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the Grafana Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Datasource config could not be assembled
    #[error("Datasource error: {0}")]
    Datasource(#[from] DatasourceError),

    /// The datasource ConfigMap is controlled by another resource
    #[error("{artifact} is controlled by {owner}")]
    ArtifactOwnedByOther {
        /// The contested ConfigMap
        artifact: String,
        /// Kind and name of its controlling owner
        owner: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
