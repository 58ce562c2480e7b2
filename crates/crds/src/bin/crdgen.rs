//! Prints the `Grafana` CustomResourceDefinition as YAML.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/grafana.yaml`

use crds::Grafana;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&Grafana::crd())?);
    Ok(())
}
