//! Fingerprint reconciliation
//!
//! Decides whether the stored datasource artifact is stale by comparing the
//! `lastConfig` annotation against the fingerprint of a freshly assembled
//! document. Payloads are never compared: a matching fingerprint means the
//! stored copy is trusted as-is.
//!
//! Per owning resource the artifact moves through:
//!
//! ```text
//! Absent ──create──▶ Present(fp0) ──unchanged──▶ Present(fp0)
//!                         │
//!                         └──inputs changed──▶ Present(fp1)
//! ```

use crate::artifact::{ArtifactKey, StoredArtifact};
use crate::context::PassContext;
use crate::document::{assemble, AssembledDocument};
use crate::error::DatasourceError;
use crate::secrets::SecretProvider;
use crds::GrafanaDatasource;
use tracing::{debug, info};

/// What the caller has to do with the returned artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No artifact existed; the returned one must be created
    Created,
    /// The stored artifact is stale; the returned one replaces it wholesale
    Updated,
    /// The stored artifact is current; nothing to write
    Unchanged,
}

/// Outcome of a reconciliation pass: the complete next state.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Artifact the cluster should hold after this pass
    pub artifact: StoredArtifact,
    /// Whether and how it differs from the stored one
    pub verdict: Verdict,
}

impl Reconciled {
    /// Whether the artifact has to be written.
    pub fn changed(&self) -> bool {
        self.verdict != Verdict::Unchanged
    }
}

/// Reconciles `document` against the stored artifact.
///
/// - no stored artifact: a fresh one is built under `key`
/// - `lastConfig` equals the document fingerprint: `current` is returned as-is
/// - otherwise: a copy of `current` with payload and `lastConfig` replaced
pub fn reconcile(
    ctx: &PassContext,
    document: &AssembledDocument,
    current: Option<&StoredArtifact>,
    key: &ArtifactKey,
) -> Reconciled {
    let fingerprint = document.fingerprint();

    let Some(current) = current else {
        info!(parent: ctx.span(), artifact = %key, %fingerprint, "Datasource config absent, creating");
        return Reconciled {
            artifact: StoredArtifact::create(key, document),
            verdict: Verdict::Created,
        };
    };

    if fingerprint.matches(current.last_config()) {
        debug!(parent: ctx.span(), artifact = %key, %fingerprint, "Datasource config up-to-date");
        return Reconciled {
            artifact: current.clone(),
            verdict: Verdict::Unchanged,
        };
    }

    info!(
        parent: ctx.span(),
        artifact = %key,
        previous = current.last_config().unwrap_or("<none>"),
        %fingerprint,
        "Datasource config changed, replacing"
    );
    Reconciled {
        artifact: current.with_document(document),
        verdict: Verdict::Updated,
    }
}

/// Runs a full pass: loads secrets, assembles the document and reconciles
/// it against `current`.
///
/// Assembly failures surface as [`DatasourceError::AssemblyFailed`]; no
/// artifact is produced in that case and the stored one must be left alone.
pub fn reconcile_pass<P>(
    ctx: &PassContext,
    desired: &GrafanaDatasource,
    provider: &P,
    current: Option<&StoredArtifact>,
    key: &ArtifactKey,
) -> Result<Reconciled, DatasourceError>
where
    P: SecretProvider + ?Sized,
{
    let document = assemble(ctx, desired, provider).map_err(|e| DatasourceError::AssemblyFailed(Box::new(e)))?;
    Ok(reconcile(ctx, &document, current, key))
}
