//! Content fingerprint of a rendered datasource document.
//!
//! MD5 is used as a change detector only. Its hex form is what lands in the
//! `lastConfig` annotation, so changing the digest would make every existing
//! artifact look stale once.

use std::fmt;

/// Lowercase hex MD5 digest (32 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprints serialized document bytes.
    pub fn of(bytes: &[u8]) -> Self {
        Self(format!("{:x}", md5::compute(bytes)))
    }

    /// Hex representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a recorded annotation value refers to this fingerprint.
    pub fn matches(&self, recorded: Option<&str>) -> bool {
        recorded == Some(self.0.as_str())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}
