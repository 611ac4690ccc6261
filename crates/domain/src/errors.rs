//! Error types used throughout the client.
//!
//! Both enums are closed: every transport failure is classified into one of
//! these variants at the boundary, so downstream logic matches on a finite
//! set instead of inspecting messages or status codes.

use std::time::Duration;

use thiserror::Error;

/// Authentication and session lifecycle errors.
///
/// `Clone` is required because the single-flight refresh broadcasts one
/// outcome to every waiting caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The server explicitly rejected the username/password. Terminal; the
    /// stored credential for this identity is deleted.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A second authentication failure occurred immediately after a
    /// successful refresh. Terminal; the credential is preserved because it
    /// may still be valid.
    #[error("authentication expired after refresh")]
    AuthenticationExpired,

    /// The request never produced an HTTP response (timeout, DNS, reset).
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// A connection to the server could not be established.
    #[error("server unreachable: {0}")]
    ServerUnreachable(String),

    /// The server answered with a 5xx-equivalent status.
    #[error("server error: {0}")]
    ServerError(String),

    /// The platform key store cannot be read or written. Fatal for the
    /// credential operation only; login itself still works.
    #[error("credential storage unavailable: {0}")]
    EncryptionUnavailable(String),

    /// An operation that requires a live session was called while logged out.
    #[error("not logged in")]
    NotLoggedIn,

    /// The server address could not be canonicalized.
    #[error("invalid server address: {0}")]
    InvalidServerUrl(String),
}

impl AuthError {
    /// Whether the failure is transient and worth retrying later.
    ///
    /// Transient failures never indict the stored credential.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnavailable(_) | Self::ServerUnreachable(_) | Self::ServerError(_)
        )
    }
}

/// Categories of request-execution errors, used by the retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorCategory {
    /// Authentication failures - handled by re-authentication, never by
    /// backoff retry.
    Authentication,
    /// Network/connection errors - retryable.
    Network,
    /// Server errors (5xx) - retryable.
    Server,
    /// Client errors (4xx except auth, decode failures) - non-retryable.
    Client,
    /// Local configuration errors - non-retryable.
    Config,
}

/// Errors produced while executing an authenticated API call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// The server answered 401/403. Internal signal consumed by the request
    /// executor to trigger a single re-authentication; collaborators only
    /// ever see the terminal [`ExecError::Auth`] outcomes.
    #[error("authentication required")]
    Unauthorized,

    /// Terminal authentication outcome.
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("network error: {0}")]
    Network(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("client error: {0}")]
    Client(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("timeout after {0:?}")]
    Timeout(Duration),
}

impl ExecError {
    /// Classify this error for retry purposes.
    #[must_use]
    pub fn category(&self) -> ExecErrorCategory {
        match self {
            Self::Unauthorized | Self::Auth(_) => ExecErrorCategory::Authentication,
            Self::Network(_) | Self::Timeout(_) => ExecErrorCategory::Network,
            Self::Server(_) => ExecErrorCategory::Server,
            Self::Client(_) => ExecErrorCategory::Client,
            Self::Config(_) => ExecErrorCategory::Config,
        }
    }

    /// Whether the backoff retry loop may re-run the operation.
    ///
    /// Authentication failures are excluded: those are handled exclusively
    /// by the one-shot re-authentication path.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.category(), ExecErrorCategory::Network | ExecErrorCategory::Server)
    }
}
