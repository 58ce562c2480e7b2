//! Mutual-TLS secret material
//!
//! The three certificates are read through a [`SecretProvider`] so the
//! assembler never touches hard-coded paths. [`FsSecretProvider`] reads the
//! volumes mounted into the operator pod; tests use
//! `MockSecretProvider`.

use crate::error::{DatasourceError, SecretError};
use std::fs;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default mount point of the monitoring CA certificate volume.
pub const DEFAULT_CA_CERT_DIR: &str = "/opt/ibm/monitoring/caCerts/";
/// Default mount point of the monitoring client certificate volume.
pub const DEFAULT_CLIENT_CERT_DIR: &str = "/opt/ibm/monitoring/certs/";

const CERT_FILE: &str = "tls.crt";
const KEY_FILE: &str = "tls.key";

/// Identifies one of the three secrets a datasource needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKind {
    /// CA certificate used to verify the datasource
    CaCert,
    /// Client certificate presented to the datasource
    ClientCert,
    /// Private key of the client certificate
    ClientKey,
}

impl SecretKind {
    /// All secrets, in load order.
    pub const ALL: [SecretKind; 3] = [SecretKind::CaCert, SecretKind::ClientCert, SecretKind::ClientKey];
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SecretKind::CaCert => "CA certificate",
            SecretKind::ClientCert => "client certificate",
            SecretKind::ClientKey => "client key",
        })
    }
}

/// The loaded secret text. `Debug` never prints the content.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretMaterial {
    ca_cert: String,
    client_cert: String,
    client_key: String,
}

impl SecretMaterial {
    /// Bundles already-loaded secrets.
    pub fn new(ca_cert: impl Into<String>, client_cert: impl Into<String>, client_key: impl Into<String>) -> Self {
        Self {
            ca_cert: ca_cert.into(),
            client_cert: client_cert.into(),
            client_key: client_key.into(),
        }
    }

    /// One secret, as it is embedded in the document.
    pub fn get(&self, secret: SecretKind) -> &str {
        match secret {
            SecretKind::CaCert => &self.ca_cert,
            SecretKind::ClientCert => &self.client_cert,
            SecretKind::ClientKey => &self.client_key,
        }
    }
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretMaterial")
            .field("ca_cert", &"<redacted>")
            .field("client_cert", &"<redacted>")
            .field("client_key", &"<redacted>")
            .finish()
    }
}

/// Source of the mutual-TLS secrets for one reconciliation pass.
pub trait SecretProvider: Send + Sync {
    /// Reads a single secret. Content must be UTF-8 text.
    fn read(&self, secret: SecretKind) -> Result<String, SecretError>;

    /// Reads all three secrets. Fails on the first one that cannot be read.
    fn load(&self) -> Result<SecretMaterial, DatasourceError> {
        let read = |secret: SecretKind| self.read(secret).map_err(|source| DatasourceError::SecretUnavailable { secret, source });
        Ok(SecretMaterial {
            ca_cert: read(SecretKind::CaCert)?,
            client_cert: read(SecretKind::ClientCert)?,
            client_key: read(SecretKind::ClientKey)?,
        })
    }
}

/// Reads secrets from the certificate volumes mounted into the pod.
///
/// Layout: `<ca_dir>/tls.crt`, `<cert_dir>/tls.crt`, `<cert_dir>/tls.key`.
#[derive(Debug, Clone)]
pub struct FsSecretProvider {
    ca_dir: PathBuf,
    cert_dir: PathBuf,
}

impl FsSecretProvider {
    /// Creates a provider over the given CA and client certificate directories.
    pub fn new(ca_dir: impl Into<PathBuf>, cert_dir: impl Into<PathBuf>) -> Self {
        Self {
            ca_dir: ca_dir.into(),
            cert_dir: cert_dir.into(),
        }
    }

    /// File backing a secret.
    pub fn path_for(&self, secret: SecretKind) -> PathBuf {
        match secret {
            SecretKind::CaCert => self.ca_dir.join(CERT_FILE),
            SecretKind::ClientCert => self.cert_dir.join(CERT_FILE),
            SecretKind::ClientKey => self.cert_dir.join(KEY_FILE),
        }
    }

    /// CA certificate directory.
    pub fn ca_dir(&self) -> &Path {
        &self.ca_dir
    }

    /// Client certificate directory.
    pub fn cert_dir(&self) -> &Path {
        &self.cert_dir
    }
}

impl Default for FsSecretProvider {
    fn default() -> Self {
        Self::new(DEFAULT_CA_CERT_DIR, DEFAULT_CLIENT_CERT_DIR)
    }
}

impl SecretProvider for FsSecretProvider {
    fn read(&self, secret: SecretKind) -> Result<String, SecretError> {
        let path = self.path_for(secret);
        match fs::read(&path) {
            Ok(bytes) => String::from_utf8(bytes).map_err(|_| SecretError::InvalidEncoding { path }),
            Err(source) => Err(SecretError::Io { path, source }),
        }
    }
}
