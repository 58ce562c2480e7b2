//! Reconciliation logic for the Grafana CRD.
//!
//! Each pass reads the stored datasource `ConfigMap`, hands it to the
//! datasource reconciler together with the `Grafana` spec and the mounted
//! certificates, and then applies the verdict: create, replace, or nothing.

use crate::backoff::FibonacciBackoff;
use crate::error::ControllerError;
use crate::store::ClusterStore;
use crds::{Grafana, GrafanaStatus};
use grafana_datasource::{
    datasource_selector, reconcile_pass, PassContext, SecretProvider, StoredArtifact, Verdict,
};
use kube::{Resource, ResourceExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Reconciles `Grafana` resources into their datasource `ConfigMap`.
pub struct Reconciler {
    store: Box<dyn ClusterStore>,
    secrets: Arc<dyn SecretProvider>,
    resync_interval: Duration,
    backoff_max_minutes: u64,
    /// Backoff per resource (namespace/name -> FibonacciBackoff)
    backoff_states: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        store: impl ClusterStore + 'static,
        secrets: Arc<dyn SecretProvider>,
        resync_interval: Duration,
        backoff_max_minutes: u64,
    ) -> Self {
        Self {
            store: Box::new(store),
            secrets,
            resync_interval,
            backoff_max_minutes,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Requeue interval after a successful pass.
    pub fn resync_interval(&self) -> Duration {
        self.resync_interval
    }

    /// Reconciles the datasource `ConfigMap` of one `Grafana` resource.
    pub async fn reconcile_grafana(&self, grafana: &Grafana) -> Result<Verdict, ControllerError> {
        let name = grafana.name_any();
        let key = datasource_selector(grafana)
            .ok_or_else(|| ControllerError::InvalidConfig(format!("Grafana {} has no namespace", name)))?;
        let ctx = PassContext::for_owner(&key.namespace, &name);

        let current = self.store.get_artifact(&key).await?;
        if let Some(owner) = current.as_ref().and_then(|artifact| foreign_controller(artifact, grafana)) {
            return Err(ControllerError::ArtifactOwnedByOther {
                artifact: key.to_string(),
                owner,
            });
        }
        let outcome = reconcile_pass(
            &ctx,
            &grafana.spec.datasource,
            &*self.secrets,
            current.as_ref(),
            &key,
        )?;
        let fingerprint = outcome.artifact.last_config().map(str::to_string);

        match outcome.verdict {
            Verdict::Created => {
                let artifact = owned_by(outcome.artifact, grafana);
                self.store.create_artifact(&key, artifact).await?;
                info!(parent: ctx.span(), "Created datasource ConfigMap {}", key);
            }
            Verdict::Updated => {
                self.store.replace_artifact(&key, outcome.artifact).await?;
                info!(parent: ctx.span(), "Replaced datasource ConfigMap {}", key);
            }
            Verdict::Unchanged => {
                debug!(parent: ctx.span(), "Datasource ConfigMap {} is up-to-date", key);
            }
        }

        let recorded = grafana.status.as_ref().and_then(|s| s.datasource_fingerprint.clone());
        if recorded != fingerprint {
            let last_applied = match outcome.verdict {
                Verdict::Unchanged => grafana.status.as_ref().and_then(|s| s.last_applied),
                Verdict::Created | Verdict::Updated => None,
            }
            .unwrap_or_else(chrono::Utc::now);
            let status = GrafanaStatus {
                datasource_fingerprint: fingerprint,
                last_applied: Some(last_applied),
            };
            self.store.patch_grafana_status(&key.namespace, &name, &status).await?;
        }

        Ok(outcome.verdict)
    }

    /// Next requeue delay for a failing resource.
    pub fn next_backoff(&self, resource_key: &str) -> Duration {
        match self.backoff_states.lock() {
            Ok(mut states) => states
                .entry(resource_key.to_string())
                .or_insert_with(|| FibonacciBackoff::new(1, self.backoff_max_minutes))
                .next_delay(),
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                Duration::from_secs(60)
            }
        }
    }

    /// Forgets the backoff of a resource after a successful pass.
    pub fn reset_backoff(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(resource_key);
        }
    }
}

/// Key used for per-resource bookkeeping.
pub fn resource_key(grafana: &Grafana) -> String {
    format!("{}/{}", grafana.namespace().unwrap_or_default(), grafana.name_any())
}

/// Marks a freshly created artifact as controlled by `grafana`, so it is
/// garbage collected with it and its changes are watched.
fn owned_by(artifact: StoredArtifact, grafana: &Grafana) -> StoredArtifact {
    let mut config_map = artifact.into_config_map();
    if let Some(owner) = grafana.controller_owner_ref(&()) {
        config_map.metadata.owner_references = Some(vec![owner]);
    }
    StoredArtifact::from(config_map)
}

/// Controlling owner of `artifact` when it is not `grafana`.
fn foreign_controller(artifact: &StoredArtifact, grafana: &Grafana) -> Option<String> {
    let owners = artifact.as_config_map().metadata.owner_references.as_ref()?;
    owners
        .iter()
        .find(|owner| owner.controller == Some(true))
        .filter(|owner| grafana.uid().as_deref() != Some(owner.uid.as_str()))
        .map(|owner| format!("{} {}", owner.kind, owner.name))
}
