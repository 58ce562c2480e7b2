//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the Kubernetes
//! client, the certificate provider and the reconciler together and runs the
//! Grafana watcher.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::store::KubeStore;
use crate::watcher::Watcher;
use crds::Grafana;
use grafana_datasource::{SecretKind, SecretProvider};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Main controller for the Grafana datasource config.
pub struct Controller {
    grafana_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its watcher.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        let kube_client = Client::try_default().await?;

        let secrets = config.secret_provider();
        // Missing certificates are not fatal at startup; passes fail and
        // back off until the volumes are mounted.
        for secret in SecretKind::ALL {
            if let Err(e) = secrets.read(secret) {
                warn!("{} not readable yet ({}): {}", secret, secrets.path_for(secret).display(), e);
            }
        }

        let (grafana_api, config_map_api): (Api<Grafana>, Api<ConfigMap>) = match config.namespace.as_deref() {
            Some(ns) => (
                Api::namespaced(kube_client.clone(), ns),
                Api::namespaced(kube_client.clone(), ns),
            ),
            None => (Api::all(kube_client.clone()), Api::all(kube_client.clone())),
        };

        let reconciler = Arc::new(Reconciler::new(
            KubeStore::new(kube_client),
            Arc::new(secrets),
            config.resync_interval,
            config.backoff_max_minutes,
        ));

        let watcher = Watcher::new(reconciler, grafana_api, config_map_api);
        let grafana_watcher = tokio::spawn(async move { watcher.watch_grafanas().await });

        info!("Controller initialized");
        Ok(Self { grafana_watcher })
    }

    /// Runs the controller until the watcher stops.
    pub async fn run(self) -> Result<(), ControllerError> {
        self.grafana_watcher
            .await
            .map_err(|e| ControllerError::Watch(format!("Grafana watcher task failed: {}", e)))?
    }
}
