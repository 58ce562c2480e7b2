//! Per-pass logging context.
//!
//! Both operations take a [`PassContext`] rather than reaching for a global
//! logger, so every event of a pass is attributed to the owning resource.

use tracing::Span;

/// Logging context for one reconciliation pass.
#[derive(Debug, Clone)]
pub struct PassContext {
    span: Span,
}

impl PassContext {
    /// Context scoped to the owning `Grafana` resource.
    pub fn for_owner(namespace: &str, name: &str) -> Self {
        Self {
            span: tracing::info_span!("datasource", namespace = %namespace, owner = %name),
        }
    }

    /// Context that records nothing.
    pub fn detached() -> Self {
        Self { span: Span::none() }
    }

    /// Span events of this pass are emitted under.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl From<Span> for PassContext {
    fn from(span: Span) -> Self {
        Self { span }
    }
}
