//! Grafana datasource descriptor
//!
//! The provisioning shape Grafana reads from `datasource.yaml`. Field names on
//! the wire follow Grafana's provisioning schema (`jsonData`,
//! `secureJsonData`, `tlsCACert`, ...).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Logical definition of the monitoring datasource, before any secret
/// material is injected.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaDatasource {
    /// Datasource display name
    pub name: String,

    /// Datasource plugin type (e.g., "prometheus")
    #[serde(rename = "type")]
    pub kind: String,

    /// Access mode ("proxy" or "direct")
    #[serde(default = "default_access")]
    pub access: String,

    /// Endpoint URL of the datasource
    pub url: String,

    /// Grafana organisation the datasource belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,

    /// Whether this is the organisation's default datasource
    #[serde(default)]
    pub is_default: bool,

    /// Whether users may edit the datasource from the UI
    #[serde(default)]
    pub editable: bool,

    /// Non-secret connection settings
    #[serde(default)]
    pub json_data: DatasourceJsonData,

    /// Secret connection settings. Populated by the controller from the
    /// mounted certificate volumes; anything set here by users is replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_json_data: Option<SecureJsonData>,
}

fn default_access() -> String {
    "proxy".to_string()
}

/// Non-secret `jsonData` block.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceJsonData {
    /// Present the client certificate to the datasource (mutual TLS)
    #[serde(default)]
    pub tls_auth: bool,

    /// Verify the datasource against the injected CA certificate
    #[serde(default, rename = "tlsAuthWithCACert")]
    pub tls_auth_with_ca_cert: bool,

    /// Skip server certificate verification
    #[serde(default)]
    pub tls_skip_verify: bool,

    /// Scrape interval hint shown in the query editor (e.g., "30s")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_interval: Option<String>,

    /// HTTP method used for queries ("GET" or "POST")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
}

/// Secret `secureJsonData` block holding the mutual-TLS material.
#[derive(Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub struct SecureJsonData {
    /// PEM encoded CA certificate
    #[serde(rename = "tlsCACert", default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<String>,

    /// PEM encoded client certificate
    #[serde(rename = "tlsClientCert", default, skip_serializing_if = "Option::is_none")]
    pub tls_client_cert: Option<String>,

    /// PEM encoded client key
    #[serde(rename = "tlsClientKey", default, skip_serializing_if = "Option::is_none")]
    pub tls_client_key: Option<String>,
}

impl std::fmt::Debug for SecureJsonData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("SecureJsonData")
            .field("tls_ca_cert", &redact(&self.tls_ca_cert))
            .field("tls_client_cert", &redact(&self.tls_client_cert))
            .field("tls_client_key", &redact(&self.tls_client_key))
            .finish()
    }
}
