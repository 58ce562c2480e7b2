//! Controller configuration loaded from environment variables.
//!
//! | Variable                  | Default                          |
//! |---------------------------|----------------------------------|
//! | `WATCH_NAMESPACE`         | all namespaces                   |
//! | `GRAFANA_CA_CERT_DIR`     | `/opt/ibm/monitoring/caCerts/`   |
//! | `GRAFANA_CLIENT_CERT_DIR` | `/opt/ibm/monitoring/certs/`     |
//! | `RESYNC_INTERVAL_SECS`    | `300`                            |
//! | `BACKOFF_MAX_MINUTES`     | `10`                             |

use crate::error::ControllerError;
use grafana_datasource::{FsSecretProvider, DEFAULT_CA_CERT_DIR, DEFAULT_CLIENT_CERT_DIR};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_RESYNC_SECS: u64 = 300;
const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Runtime settings of the Grafana Controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Namespace to watch; `None` watches every namespace
    pub namespace: Option<String>,
    /// Directory holding the CA certificate (`tls.crt`)
    pub ca_cert_dir: PathBuf,
    /// Directory holding the client certificate and key (`tls.crt`, `tls.key`)
    pub client_cert_dir: PathBuf,
    /// Requeue interval after a successful pass
    pub resync_interval: Duration,
    /// Upper bound of the error backoff, in minutes
    pub backoff_max_minutes: u64,
}

impl ControllerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty());
        let ca_cert_dir = lookup("GRAFANA_CA_CERT_DIR").unwrap_or_else(|| DEFAULT_CA_CERT_DIR.to_string());
        let client_cert_dir = lookup("GRAFANA_CLIENT_CERT_DIR").unwrap_or_else(|| DEFAULT_CLIENT_CERT_DIR.to_string());
        let resync_secs = parse_u64(&lookup, "RESYNC_INTERVAL_SECS", DEFAULT_RESYNC_SECS)?;
        let backoff_max_minutes = parse_u64(&lookup, "BACKOFF_MAX_MINUTES", DEFAULT_BACKOFF_MAX_MINUTES)?;

        if resync_secs == 0 {
            return Err(ControllerError::InvalidConfig(
                "RESYNC_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            namespace,
            ca_cert_dir: PathBuf::from(ca_cert_dir),
            client_cert_dir: PathBuf::from(client_cert_dir),
            resync_interval: Duration::from_secs(resync_secs),
            backoff_max_minutes,
        })
    }

    /// Secret provider over the configured certificate directories.
    pub fn secret_provider(&self) -> FsSecretProvider {
        FsSecretProvider::new(&self.ca_cert_dir, &self.client_cert_dir)
    }
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ControllerError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ControllerError::InvalidConfig(format!("{} must be a non-negative integer, got '{}'", key, raw))
        }),
    }
}
