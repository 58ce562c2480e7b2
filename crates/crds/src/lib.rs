//! Grafana operator CRD definitions
//!
//! Kubernetes Custom Resource Definitions and the datasource descriptor
//! types shared by the datasource assembler and the controller.

pub mod datasource;
pub mod grafana;

pub use datasource::*;
pub use grafana::*;
