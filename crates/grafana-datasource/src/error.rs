//! Datasource assembly errors

use crate::secrets::SecretKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while producing a datasource document or artifact.
#[derive(Debug, Error)]
pub enum DatasourceError {
    /// A required secret could not be read
    #[error("{secret} unavailable: {source}")]
    SecretUnavailable {
        /// Which of the three secrets failed
        secret: SecretKind,
        /// Underlying provider failure
        #[source]
        source: SecretError,
    },

    /// The document could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Assembly failed before reconciliation could start
    #[error("Datasource assembly failed: {0}")]
    AssemblyFailed(#[source] Box<DatasourceError>),
}

/// Errors returned by a [`SecretProvider`](crate::SecretProvider).
///
/// Never carries secret content, only where it was looked for.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Reading the backing file failed (missing, permissions, ...)
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was read
        path: PathBuf,
        /// I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Content is not UTF-8 text and cannot be embedded in the document
    #[error("{} is not valid UTF-8 text", path.display())]
    InvalidEncoding {
        /// File holding the content
        path: PathBuf,
    },

    /// Provider has no value for this secret
    #[error("no {0} provided")]
    Missing(SecretKind),
}
