//! Grafana CRD
//!
//! Owning resource for the datasource configuration. One `Grafana` object
//! yields exactly one datasource `ConfigMap` in its namespace.

use crate::datasource::GrafanaDatasource;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "operator.ibm.com",
    version = "v1alpha1",
    kind = "Grafana",
    namespaced,
    status = "GrafanaStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaSpec {
    /// Monitoring datasource wired into Grafana over mutual TLS
    pub datasource: GrafanaDatasource,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaStatus {
    /// Fingerprint of the datasource config last written to the cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource_fingerprint: Option<String>,

    /// Last time the datasource config was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_applied: Option<chrono::DateTime<chrono::Utc>>,
}
