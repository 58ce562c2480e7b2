//! In-memory secret provider for unit testing
//!
//! Lets the assembler and the controller be exercised without certificate
//! files on disk, including the failure paths.

use crate::error::SecretError;
use crate::secrets::{SecretKind, SecretProvider};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Mock secret provider
///
/// Values can be swapped between passes with [`set`](Self::set) to simulate
/// certificate rotation. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockSecretProvider {
    values: Arc<Mutex<HashMap<SecretKind, String>>>,
    failing: Arc<Mutex<HashSet<SecretKind>>>,
}

impl MockSecretProvider {
    /// Create a provider holding all three secrets
    pub fn new(ca_cert: impl Into<String>, client_cert: impl Into<String>, client_key: impl Into<String>) -> Self {
        let provider = Self::default();
        provider.set(SecretKind::CaCert, ca_cert);
        provider.set(SecretKind::ClientCert, client_cert);
        provider.set(SecretKind::ClientKey, client_key);
        provider
    }

    /// Make reads of `secret` fail with [`SecretError::Missing`]
    pub fn failing(self, secret: SecretKind) -> Self {
        self.set_failing(secret, true);
        self
    }

    /// Toggle failure of `secret`
    pub fn set_failing(&self, secret: SecretKind, failing: bool) {
        if let Ok(mut set) = self.failing.lock() {
            if failing {
                set.insert(secret);
            } else {
                set.remove(&secret);
            }
        }
    }

    /// Replace the value of `secret`
    pub fn set(&self, secret: SecretKind, value: impl Into<String>) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(secret, value.into());
        }
    }
}

impl SecretProvider for MockSecretProvider {
    fn read(&self, secret: SecretKind) -> Result<String, SecretError> {
        let failing = self.failing.lock().map(|set| set.contains(&secret)).unwrap_or(true);
        if failing {
            return Err(SecretError::Missing(secret));
        }
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(&secret).cloned())
            .ok_or(SecretError::Missing(secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_rotation_and_failure() {
        let provider = MockSecretProvider::new("A", "B", "C");
        assert_eq!(provider.load().unwrap().get(SecretKind::ClientKey), "C");

        provider.set(SecretKind::ClientKey, "C2");
        assert_eq!(provider.load().unwrap().get(SecretKind::ClientKey), "C2");

        provider.set_failing(SecretKind::CaCert, true);
        assert!(provider.load().is_err());

        provider.set_failing(SecretKind::CaCert, false);
        assert!(provider.load().is_ok());
    }

    #[test]
    fn test_unset_secret_is_missing() {
        let provider = MockSecretProvider::default();
        for secret in SecretKind::ALL {
            assert!(matches!(provider.read(secret), Err(SecretError::Missing(kind)) if kind == secret));
        }
    }
}
