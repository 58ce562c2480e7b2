//! Grafana Controller
//!
//! Keeps the Grafana datasource `ConfigMap` in sync with `Grafana` CRs and
//! the mutual-TLS certificates mounted into the operator pod. The config is
//! only rewritten when its fingerprint changes.

mod backoff;
mod config;
mod controller;
mod error;
mod reconciler;
mod store;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::ControllerConfig;
use crate::controller::Controller;
use crate::error::ControllerError;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        info!("rustls crypto provider already installed");
    }

    info!("Starting Grafana Controller");

    let config = ControllerConfig::from_env()?;
    info!("Configuration:");
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  CA certificate dir: {}", config.ca_cert_dir.display());
    info!("  Client certificate dir: {}", config.client_cert_dir.display());
    info!("  Resync interval: {}s", config.resync_interval.as_secs());

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
