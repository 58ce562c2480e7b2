//! Grafana datasource config assembly and reconciliation
//!
//! Builds the provisioning document that wires a monitoring datasource into
//! Grafana over mutual TLS, and decides from content fingerprints whether the
//! `ConfigMap` stored in the cluster has to be replaced.
//!
//! # Example
//!
//! ```no_run
//! use grafana_datasource::{reconcile_pass, ArtifactKey, FsSecretProvider, PassContext};
//! use crds::GrafanaDatasource;
//!
//! # fn example(desired: &GrafanaDatasource) -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = PassContext::for_owner("monitoring", "grafana");
//! let key = ArtifactKey::in_namespace("monitoring");
//! let provider = FsSecretProvider::default();
//!
//! let outcome = reconcile_pass(&ctx, desired, &provider, None, &key)?;
//! if outcome.changed() {
//!     let config_map = outcome.artifact.into_config_map();
//!     // create or replace `config_map` in the cluster
//! #   let _ = config_map;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Canonical rendering**: sorted keys, identical bytes for identical content
//! - **Fingerprinting**: MD5 hex digest recorded in the `lastConfig` annotation
//! - **Idempotent reconcile**: unchanged inputs never produce a write
//! - **Pluggable secrets**: filesystem provider, in-memory mock behind `test-util`

pub mod artifact;
pub mod context;
pub mod document;
pub mod error;
pub mod fingerprint;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod reconcile;
pub mod secrets;

pub use artifact::{datasource_selector, ArtifactKey, StoredArtifact, ARTIFACT_NAME, DATASOURCE_FILE, LAST_CONFIG_ANNOTATION};
pub use context::PassContext;
pub use document::{assemble, AssembledDocument, SCHEMA_VERSION};
pub use error::{DatasourceError, SecretError};
pub use fingerprint::Fingerprint;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockSecretProvider;
pub use reconcile::{reconcile, reconcile_pass, Reconciled, Verdict};
pub use secrets::{FsSecretProvider, SecretKind, SecretMaterial, SecretProvider, DEFAULT_CA_CERT_DIR, DEFAULT_CLIENT_CERT_DIR};
