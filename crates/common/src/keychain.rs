//! Generic keychain provider for secure credential storage.
//!
//! Thin wrapper over the platform keychain (macOS Keychain, Windows
//! Credential Manager, Linux Secret Service) for persisting arbitrary
//! secrets. Domain-specific helpers are built on top in
//! [`crate::credentials`].
//!
//! All operations here are blocking; callers on async paths must wrap them
//! in `spawn_blocking` (the [`crate::credentials::KeyringStore`] adapter
//! does exactly that).

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

/// Keychain error types.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Keychain access failed (permission denied, locked, unavailable).
    #[error("keychain access failed: {0}")]
    AccessFailed(String),

    /// Entry not found in keychain.
    #[error("entry not found")]
    NotFound,
}

/// Provider for secrets stored under a single service name.
pub struct KeychainProvider {
    service_name: String,
}

impl KeychainProvider {
    /// Create a provider for a specific service (e.g. `"Mariner.credentials"`).
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    /// Store a secret value in the platform keychain.
    ///
    /// # Errors
    /// Returns [`KeychainError::AccessFailed`] if the keychain cannot be
    /// written.
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "storing secret in keychain");

        let entry = self.create_entry(key)?;
        entry.set_password(value).map_err(|e| {
            KeychainError::AccessFailed(format!("failed to store secret for {key}: {e}"))
        })
    }

    /// Retrieve a secret value from the platform keychain.
    ///
    /// # Errors
    /// Returns [`KeychainError::NotFound`] if no entry exists, or
    /// [`KeychainError::AccessFailed`] if the keychain cannot be read.
    pub fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        debug!(service = %self.service_name, key = %key, "retrieving secret from keychain");

        let entry = self.create_entry(key)?;
        entry.get_password().map_err(|e| {
            if matches!(e, keyring::Error::NoEntry) {
                KeychainError::NotFound
            } else {
                KeychainError::AccessFailed(format!("failed to retrieve secret for {key}: {e}"))
            }
        })
    }

    /// Delete a secret from the platform keychain (idempotent).
    ///
    /// # Errors
    /// Returns [`KeychainError::AccessFailed`] only on genuine keychain
    /// failures; a missing entry is not an error.
    pub fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "deleting secret from keychain");

        let entry = self.create_entry(key)?;
        if let Err(e) = entry.delete_credential() {
            if !matches!(e, keyring::Error::NoEntry) {
                return Err(KeychainError::AccessFailed(format!(
                    "failed to delete secret for {key}: {e}"
                )));
            }
        }
        Ok(())
    }

    /// Check whether a secret exists.
    #[must_use]
    pub fn secret_exists(&self, key: &str) -> bool {
        match self.create_entry(key) {
            Ok(entry) => entry.get_password().is_ok(),
            Err(_) => false,
        }
    }

    fn create_entry(&self, account: &str) -> Result<Entry, KeychainError> {
        Entry::new(&self.service_name, account).map_err(|e| {
            KeychainError::AccessFailed(format!("failed to create keychain entry: {e}"))
        })
    }
}
