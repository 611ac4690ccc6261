//! At-rest credential storage keyed by canonical server identity.
//!
//! The store holds exactly one secret per `(server, username)` pair. It has
//! no business logic: deciding *when* to save or delete a credential is the
//! auth repository's job. The one policy this module does encode is in its
//! error surface: a missing entry is a normal outcome (`NotFound`), distinct
//! from an inaccessible key store (`EncryptionUnavailable`), because callers
//! must never treat "could not read" as "credential is wrong".

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use mariner_domain::ServerIdentity;
use thiserror::Error;
use tracing::debug;

use crate::keychain::{KeychainError, KeychainProvider};

/// Credential store failure modes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No credential exists for the given identity/username. A normal
    /// outcome, not a fault.
    #[error("no stored credential")]
    NotFound,

    /// The platform key store is inaccessible. Fatal for this operation
    /// only; the caller degrades gracefully.
    #[error("credential storage unavailable: {0}")]
    EncryptionUnavailable(String),
}

/// Async seam over the secret backing store.
///
/// The production impl is [`KeyringStore`]; tests use
/// [`MemorySecretStore`].
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<(), CredentialError>;
    async fn get(&self, key: &str) -> Result<String, CredentialError>;
    async fn delete(&self, key: &str) -> Result<(), CredentialError>;
}

/// Platform keychain adapter.
///
/// Keyring calls are blocking I/O, so every operation is pushed onto the
/// blocking thread pool to keep latency-sensitive async paths clear.
pub struct KeyringStore {
    provider: Arc<KeychainProvider>,
}

impl KeyringStore {
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { provider: Arc::new(KeychainProvider::new(service_name)) }
    }
}

fn map_keychain_error(err: KeychainError) -> CredentialError {
    match err {
        KeychainError::NotFound => CredentialError::NotFound,
        KeychainError::AccessFailed(msg) => CredentialError::EncryptionUnavailable(msg),
    }
}

fn join_error(err: tokio::task::JoinError) -> CredentialError {
    CredentialError::EncryptionUnavailable(format!("keychain task failed: {err}"))
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), CredentialError> {
        let provider = Arc::clone(&self.provider);
        let (key, value) = (key.to_string(), value.to_string());
        tokio::task::spawn_blocking(move || provider.set_secret(&key, &value))
            .await
            .map_err(join_error)?
            .map_err(map_keychain_error)
    }

    async fn get(&self, key: &str) -> Result<String, CredentialError> {
        let provider = Arc::clone(&self.provider);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || provider.get_secret(&key))
            .await
            .map_err(join_error)?
            .map_err(map_keychain_error)
    }

    async fn delete(&self, key: &str) -> Result<(), CredentialError> {
        let provider = Arc::clone(&self.provider);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || provider.delete_secret(&key))
            .await
            .map_err(join_error)?
            .map_err(map_keychain_error)
    }
}

/// In-memory secret store for deterministic tests.
#[derive(Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries; handy for asserting deletion.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), CredentialError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CredentialError::EncryptionUnavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String, CredentialError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| CredentialError::EncryptionUnavailable(e.to_string()))?;
        entries.get(key).cloned().ok_or(CredentialError::NotFound)
    }

    async fn delete(&self, key: &str) -> Result<(), CredentialError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CredentialError::EncryptionUnavailable(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Store of `(server, username) -> secret` entries.
///
/// Safe to call concurrently; the backing store serializes access itself.
pub struct CredentialStore {
    store: Arc<dyn SecretStore>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    fn entry_key(server: &ServerIdentity, username: &str) -> String {
        format!("{}|{}", server.storage_key(), username)
    }

    /// Persist the secret for a `(server, username)` pair, replacing any
    /// previous value.
    ///
    /// # Errors
    /// Returns [`CredentialError::EncryptionUnavailable`] if the key store
    /// cannot be written.
    pub async fn save(
        &self,
        server: &ServerIdentity,
        username: &str,
        secret: &str,
    ) -> Result<(), CredentialError> {
        debug!(server = %server, username = %username, "saving credential");
        self.store.set(&Self::entry_key(server, username), secret).await
    }

    /// Load the secret for a `(server, username)` pair.
    ///
    /// # Errors
    /// [`CredentialError::NotFound`] when no entry exists;
    /// [`CredentialError::EncryptionUnavailable`] when the key store cannot
    /// be read.
    pub async fn load(
        &self,
        server: &ServerIdentity,
        username: &str,
    ) -> Result<String, CredentialError> {
        self.store.get(&Self::entry_key(server, username)).await
    }

    /// Delete the entry for a `(server, username)` pair (idempotent).
    ///
    /// # Errors
    /// Returns [`CredentialError::EncryptionUnavailable`] if the key store
    /// cannot be written.
    pub async fn delete(
        &self,
        server: &ServerIdentity,
        username: &str,
    ) -> Result<(), CredentialError> {
        debug!(server = %server, username = %username, "deleting credential");
        self.store.delete(&Self::entry_key(server, username)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ServerIdentity {
        ServerIdentity::parse("https://media.example.com").unwrap()
    }

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemorySecretStore::new()))
    }

    #[tokio::test]
    async fn save_load_delete_roundtrip() {
        let creds = store();
        let server = server();

        creds.save(&server, "alice", "hunter2").await.unwrap();
        assert_eq!(creds.load(&server, "alice").await.unwrap(), "hunter2");

        creds.delete(&server, "alice").await.unwrap();
        assert_eq!(creds.load(&server, "alice").await, Err(CredentialError::NotFound));
    }

    #[tokio::test]
    async fn missing_entry_is_not_found() {
        let creds = store();
        let result = creds.load(&server(), "nobody").await;
        assert_eq!(result, Err(CredentialError::NotFound));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let creds = store();
        let server = server();

        creds.delete(&server, "alice").await.unwrap();
        creds.save(&server, "alice", "secret").await.unwrap();
        creds.delete(&server, "alice").await.unwrap();
        creds.delete(&server, "alice").await.unwrap();
    }

    #[tokio::test]
    async fn entries_are_keyed_by_canonical_identity() {
        let creds = store();
        let typed = ServerIdentity::parse("HTTPS://Media.Example.com:443/").unwrap();
        let canonical = server();

        creds.save(&typed, "alice", "secret").await.unwrap();
        assert_eq!(creds.load(&canonical, "alice").await.unwrap(), "secret");
    }

    #[tokio::test]
    async fn usernames_are_isolated() {
        let creds = store();
        let server = server();

        creds.save(&server, "alice", "a-secret").await.unwrap();
        creds.save(&server, "bob", "b-secret").await.unwrap();
        creds.delete(&server, "alice").await.unwrap();

        assert_eq!(creds.load(&server, "alice").await, Err(CredentialError::NotFound));
        assert_eq!(creds.load(&server, "bob").await.unwrap(), "b-secret");
    }
}
