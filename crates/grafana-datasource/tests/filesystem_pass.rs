//! End-to-end passes over certificates mounted on disk.

use crds::{DatasourceJsonData, GrafanaDatasource};
use grafana_datasource::{
    reconcile_pass, ArtifactKey, DatasourceError, FsSecretProvider, PassContext, SecretKind, Verdict,
};
use std::fs;
use tempfile::TempDir;

struct Mounts {
    ca: TempDir,
    certs: TempDir,
}

impl Mounts {
    fn new() -> Self {
        let mounts = Self {
            ca: TempDir::new().expect("ca dir"),
            certs: TempDir::new().expect("cert dir"),
        };
        mounts.write("ca.pem", "client.pem", "client.key");
        mounts
    }

    fn write(&self, ca: &str, cert: &str, key: &str) {
        fs::write(self.ca.path().join("tls.crt"), ca).expect("write ca");
        fs::write(self.certs.path().join("tls.crt"), cert).expect("write cert");
        fs::write(self.certs.path().join("tls.key"), key).expect("write key");
    }

    fn provider(&self) -> FsSecretProvider {
        FsSecretProvider::new(self.ca.path(), self.certs.path())
    }
}

fn desired() -> GrafanaDatasource {
    GrafanaDatasource {
        name: "prometheus".to_string(),
        kind: "prometheus".to_string(),
        access: "proxy".to_string(),
        url: "https://monitoring-prometheus:9090".to_string(),
        is_default: true,
        json_data: DatasourceJsonData {
            tls_auth: true,
            tls_auth_with_ca_cert: true,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_certificate_rotation_lifecycle() {
    let mounts = Mounts::new();
    let ctx = PassContext::for_owner("monitoring", "grafana");
    let key = ArtifactKey::in_namespace("monitoring");

    let created = reconcile_pass(&ctx, &desired(), &mounts.provider(), None, &key).expect("first pass");
    assert_eq!(created.verdict, Verdict::Created);

    let steady = reconcile_pass(&ctx, &desired(), &mounts.provider(), Some(&created.artifact), &key)
        .expect("steady pass");
    assert_eq!(steady.verdict, Verdict::Unchanged);

    mounts.write("ca.pem", "client-renewed.pem", "client-renewed.key");
    let rotated = reconcile_pass(&ctx, &desired(), &mounts.provider(), Some(&steady.artifact), &key)
        .expect("rotation pass");
    assert_eq!(rotated.verdict, Verdict::Updated);
    assert!(rotated.artifact.payload().expect("payload").contains("client-renewed.pem"));
    assert_ne!(rotated.artifact.last_config(), created.artifact.last_config());
}

#[test]
fn test_unmounted_ca_leaves_state_untouched() {
    let mounts = Mounts::new();
    fs::remove_file(mounts.ca.path().join("tls.crt")).expect("remove ca");

    let err = reconcile_pass(
        &PassContext::detached(),
        &desired(),
        &mounts.provider(),
        None,
        &ArtifactKey::in_namespace("monitoring"),
    )
    .expect_err("missing CA must fail");

    match err {
        DatasourceError::AssemblyFailed(inner) => {
            assert!(matches!(*inner, DatasourceError::SecretUnavailable { secret: SecretKind::CaCert, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}
