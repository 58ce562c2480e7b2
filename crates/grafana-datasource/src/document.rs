//! Datasource document assembly
//!
//! Injects the mutual-TLS secrets into the datasource descriptor and renders
//! the provisioning document Grafana reads:
//!
//! ```json
//! {"apiVersion":1,"datasources":{...}}
//! ```
//!
//! Rendering is canonical: object keys are emitted in sorted order at every
//! level, so the same logical content always yields the same bytes and the
//! same [`Fingerprint`].

use crate::context::PassContext;
use crate::error::DatasourceError;
use crate::fingerprint::Fingerprint;
use crate::secrets::{SecretKind, SecretMaterial, SecretProvider};
use crds::{GrafanaDatasource, SecureJsonData};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Provisioning schema version written into every document.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(rename = "apiVersion")]
    api_version: u32,
    datasources: &'a GrafanaDatasource,
}

/// A rendered datasource document with secrets injected.
///
/// Immutable once built. Two documents are equal when their serialized bytes
/// are equal.
#[derive(Clone)]
pub struct AssembledDocument {
    payload: GrafanaDatasource,
    serialized: String,
    fingerprint: Fingerprint,
}

impl AssembledDocument {
    /// Renders a document from a descriptor and already-loaded secrets.
    ///
    /// Any `secureJsonData` on `desired` is discarded and rebuilt from
    /// `secrets`.
    pub fn render(desired: &GrafanaDatasource, secrets: &SecretMaterial) -> Result<Self, DatasourceError> {
        let mut payload = desired.clone();
        payload.secure_json_data = Some(SecureJsonData {
            tls_ca_cert: Some(secrets.get(SecretKind::CaCert).to_string()),
            tls_client_cert: Some(secrets.get(SecretKind::ClientCert).to_string()),
            tls_client_key: Some(secrets.get(SecretKind::ClientKey).to_string()),
        });

        let serialized = canonical_json(&Envelope {
            api_version: SCHEMA_VERSION,
            datasources: &payload,
        })?;
        let fingerprint = Fingerprint::of(serialized.as_bytes());

        Ok(Self {
            payload,
            serialized,
            fingerprint,
        })
    }

    /// Schema version of the envelope.
    pub fn schema_version(&self) -> u32 {
        SCHEMA_VERSION
    }

    /// Datasource with secrets injected.
    pub fn payload(&self) -> &GrafanaDatasource {
        &self.payload
    }

    /// Canonical serialized form.
    pub fn serialized(&self) -> &str {
        &self.serialized
    }

    /// Fingerprint of [`serialized`](Self::serialized).
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

impl PartialEq for AssembledDocument {
    fn eq(&self, other: &Self) -> bool {
        self.serialized == other.serialized
    }
}

impl Eq for AssembledDocument {}

impl fmt::Debug for AssembledDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssembledDocument")
            .field("schema_version", &SCHEMA_VERSION)
            .field("datasource", &self.payload.name)
            .field("fingerprint", &self.fingerprint)
            .field("len", &self.serialized.len())
            .finish()
    }
}

/// Loads the secrets from `provider` and renders the datasource document.
///
/// Fails with [`DatasourceError::SecretUnavailable`] when any secret cannot be
/// read; nothing is rendered in that case.
pub fn assemble<P>(ctx: &PassContext, desired: &GrafanaDatasource, provider: &P) -> Result<AssembledDocument, DatasourceError>
where
    P: SecretProvider + ?Sized,
{
    let secrets = provider.load()?;
    let document = AssembledDocument::render(desired, &secrets)?;
    debug!(
        parent: ctx.span(),
        datasource = %desired.name,
        fingerprint = %document.fingerprint(),
        "Assembled datasource document"
    );
    Ok(document)
}

/// Serializes `value` as compact JSON with object keys sorted at every level.
fn canonical_json<T: Serialize>(value: &T) -> Result<String, DatasourceError> {
    let mut tree = serde_json::to_value(value)?;
    sort_keys(&mut tree);
    Ok(serde_json::to_string(&tree)?)
}

fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = std::mem::take(map).into_iter().collect();
            for (key, mut child) in sorted {
                sort_keys(&mut child);
                map.insert(key, child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;
    use proptest::sample::Index;

    use super::*;
    use crds::DatasourceJsonData;

    fn arb_pem() -> impl Strategy<Value = String> {
        prop::collection::vec("[A-Za-z0-9+/]{1,64}", 1..12)
            .prop_map(|lines| format!("-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n", lines.join("\n")))
    }

    fn arb_secret() -> impl Strategy<Value = String> {
        prop_oneof![arb_pem(), "\\PC{1,128}"]
    }

    fn arb_secrets() -> impl Strategy<Value = [String; 3]> {
        (arb_secret(), arb_secret(), arb_secret()).prop_map(|(ca, cert, key)| [ca, cert, key])
    }

    fn arb_datasource() -> impl Strategy<Value = GrafanaDatasource> {
        (
            "[a-z][a-z0-9-]{0,20}",
            "https://[a-z0-9.-]{1,30}(:[0-9]{2,5})?",
            proptest::option::of(1i64..1000),
            any::<(bool, bool, bool, bool)>(),
            proptest::option::of("[0-9]{1,3}s"),
        )
            .prop_map(|(name, url, org_id, (is_default, tls_auth, with_ca, skip_verify), time_interval)| {
                GrafanaDatasource {
                    name,
                    kind: "prometheus".to_string(),
                    access: "proxy".to_string(),
                    url,
                    org_id,
                    is_default,
                    json_data: DatasourceJsonData {
                        tls_auth,
                        tls_auth_with_ca_cert: with_ca,
                        tls_skip_verify: skip_verify,
                        time_interval,
                        ..Default::default()
                    },
                    ..Default::default()
                }
            })
    }

    fn material(secrets: &[String; 3]) -> SecretMaterial {
        SecretMaterial::new(secrets[0].clone(), secrets[1].clone(), secrets[2].clone())
    }

    /// Replaces the character at `at` with `with`; `None` if that is a no-op.
    fn replace_char(secret: &str, at: Index, with: char) -> Option<String> {
        let mut chars: Vec<char> = secret.chars().collect();
        let i = at.index(chars.len());
        if chars[i] == with {
            return None;
        }
        chars[i] = with;
        Some(chars.into_iter().collect())
    }

    proptest! {
        #[test]
        fn render_is_deterministic(desired in arb_datasource(), secrets in arb_secrets()) {
            let first = AssembledDocument::render(&desired, &material(&secrets)).unwrap();
            let second = AssembledDocument::render(&desired.clone(), &material(&secrets)).unwrap();
            prop_assert_eq!(first.serialized(), second.serialized());
            prop_assert_eq!(first.fingerprint(), second.fingerprint());
        }

        #[test]
        fn any_secret_mutation_changes_fingerprint(
            desired in arb_datasource(),
            secrets in arb_secrets(),
            slot in 0usize..3,
            at in any::<Index>(),
            with in any::<char>(),
        ) {
            let mutated = replace_char(&secrets[slot], at, with);
            prop_assume!(mutated.is_some());
            let mut changed = secrets.clone();
            if let Some(value) = mutated {
                changed[slot] = value;
            }

            let base = AssembledDocument::render(&desired, &material(&secrets)).unwrap();
            let other = AssembledDocument::render(&desired, &material(&changed)).unwrap();
            prop_assert_ne!(base.serialized(), other.serialized());
            prop_assert_ne!(base.fingerprint(), other.fingerprint());
        }

        #[test]
        fn descriptor_changes_change_fingerprint(
            a in arb_datasource(),
            b in arb_datasource(),
            secrets in arb_secrets(),
        ) {
            prop_assume!(a != b);
            let left = AssembledDocument::render(&a, &material(&secrets)).unwrap();
            let right = AssembledDocument::render(&b, &material(&secrets)).unwrap();
            prop_assert_ne!(left.fingerprint(), right.fingerprint());
        }

        #[test]
        fn secret_slots_are_distinguished(desired in arb_datasource(), secrets in arb_secrets()) {
            prop_assume!(secrets[0] != secrets[1]);
            let swapped = [secrets[1].clone(), secrets[0].clone(), secrets[2].clone()];
            let base = AssembledDocument::render(&desired, &material(&secrets)).unwrap();
            let other = AssembledDocument::render(&desired, &material(&swapped)).unwrap();
            prop_assert_ne!(base.fingerprint(), other.fingerprint());
        }
    }
}
