//! Shared infrastructure for the Mariner client.
//!
//! Nothing in this crate knows about sessions or the auth state machine; it
//! provides the building blocks the client crate composes:
//!
//! - [`keychain`]: thin wrapper over the platform key store
//! - [`credentials`]: the credential store keyed by canonical server identity
//! - [`retry`]: backoff/jitter strategy for transient failures

pub mod credentials;
pub mod keychain;
pub mod retry;

pub use credentials::{
    CredentialError, CredentialStore, KeyringStore, MemorySecretStore, SecretStore,
};
pub use keychain::{KeychainError, KeychainProvider};
pub use retry::{BackoffStrategy, Jitter, RetryStrategy};
