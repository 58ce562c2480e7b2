//! Kubernetes resource watchers.
//!
//! Drives the reconciler from a `kube_runtime::Controller` over `Grafana`
//! resources. Datasource ConfigMaps owned by a `Grafana` are watched too, so
//! edits or deletions of the stored config trigger a repair pass.

use crate::error::ControllerError;
use crate::reconciler::{resource_key, Reconciler};
use crds::Grafana;
use futures::StreamExt;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::Api;
use kube_runtime::{controller::{Action, Config as ControllerConfig}, watcher, Controller};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

const ARTIFACT_SELECTOR: &str = "app=grafana,component=grafana";

async fn reconcile(grafana: Arc<Grafana>, reconciler: Arc<Reconciler>) -> Result<Action, ControllerError> {
    let key = resource_key(&grafana);
    debug!("Reconciling Grafana {}", key);

    let verdict = reconciler.reconcile_grafana(&grafana).await?;
    reconciler.reset_backoff(&key);
    debug!("Grafana {} reconciled: {:?}", key, verdict);
    Ok(Action::requeue(reconciler.resync_interval()))
}

fn error_policy(grafana: Arc<Grafana>, error: &ControllerError, reconciler: Arc<Reconciler>) -> Action {
    let key = resource_key(&grafana);
    let delay = reconciler.next_backoff(&key);
    error!("Reconciliation error for Grafana {}: {} (retrying in {}s)", key, error, delay.as_secs());
    Action::requeue(delay)
}

/// Watches Kubernetes resources for changes.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    grafana_api: Api<Grafana>,
    config_map_api: Api<ConfigMap>,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(reconciler: Arc<Reconciler>, grafana_api: Api<Grafana>, config_map_api: Api<ConfigMap>) -> Self {
        Self {
            reconciler,
            grafana_api,
            config_map_api,
        }
    }

    /// Starts watching Grafana resources. Runs until the watch stream ends.
    pub async fn watch_grafanas(&self) -> Result<(), ControllerError> {
        info!("Starting Grafana watcher");

        // Debounce batches bursts of events (e.g. our own status patch)
        let controller_config = ControllerConfig::default()
            .debounce(Duration::from_secs(5))
            .concurrency(3);

        Controller::new(self.grafana_api.clone(), watcher::Config::default())
            .owns(
                self.config_map_api.clone(),
                watcher::Config::default().labels(ARTIFACT_SELECTOR),
            )
            .with_config(controller_config)
            .shutdown_on_signal()
            .run(reconcile, error_policy, self.reconciler.clone())
            .for_each(|res| async move {
                match res {
                    Ok((object, _)) => debug!("Reconciled {}", object.name),
                    Err(e) => error!("Controller error for Grafana: {}", e),
                }
            })
            .await;

        info!("Grafana watcher stopped");
        Ok(())
    }
}
