//! Authenticated request execution.
//!
//! Wraps an operation with the two recovery behaviors every authenticated
//! call needs, kept strictly separate:
//!
//! - `Unauthorized` triggers re-authentication exactly once per execution,
//!   then one retry. A second rejection means the fresh token is also bad
//!   and surfaces as an authentication failure rather than looping.
//! - Transient errors (network, server) retry under the backoff budget.
//!   They never trigger re-authentication and never touch credentials.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use mariner_common::RetryStrategy;
use mariner_domain::{AuthError, ExecError};
use tracing::{debug, warn};

use crate::repository::AuthRepository;

/// Seam for the executor's one-shot re-authentication.
#[async_trait]
pub trait Reauthenticator: Send + Sync {
    async fn reauthenticate(&self) -> Result<(), AuthError>;
}

/// Adapter routing re-authentication to the repository's single-flight
/// refresh.
pub struct RepositoryReauth(Arc<AuthRepository>);

impl RepositoryReauth {
    #[must_use]
    pub fn new(repo: Arc<AuthRepository>) -> Self {
        Self(repo)
    }
}

#[async_trait]
impl Reauthenticator for RepositoryReauth {
    async fn reauthenticate(&self) -> Result<(), AuthError> {
        self.0.refresh().await
    }
}

/// Failures from the refresh attempt keep their transport nature; only
/// genuine credential problems surface as authentication errors.
fn map_refresh_error(err: AuthError) -> ExecError {
    match err {
        AuthError::NetworkUnavailable(msg) | AuthError::ServerUnreachable(msg) => {
            ExecError::Network(msg)
        }
        AuthError::ServerError(msg) => ExecError::Server(msg),
        other => ExecError::Auth(other),
    }
}

/// Executes operations against the server with re-auth and bounded retry.
pub struct RequestExecutor {
    reauth: Arc<dyn Reauthenticator>,
    retry: RetryStrategy,
}

impl RequestExecutor {
    #[must_use]
    pub fn new(reauth: Arc<dyn Reauthenticator>, retry: RetryStrategy) -> Self {
        Self { reauth, retry }
    }

    /// Run `op`, re-authenticating at most once on `Unauthorized` and
    /// retrying transient failures under the configured budget.
    ///
    /// `op` is re-invoked from scratch on every attempt so it picks up
    /// rotated tokens and rebuilt client handles.
    ///
    /// # Errors
    /// The operation's error once recovery is exhausted;
    /// [`AuthError::AuthenticationExpired`] when a freshly refreshed token
    /// is rejected again.
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T, ExecError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ExecError>>,
    {
        let mut reauthenticated = false;
        let mut retries = 0u32;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(ExecError::Unauthorized) if !reauthenticated => {
                    debug!("request unauthorized; re-authenticating once");
                    reauthenticated = true;
                    self.reauth.reauthenticate().await.map_err(map_refresh_error)?;
                }
                Err(ExecError::Unauthorized) => {
                    // The rotated token was rejected too; do not loop.
                    warn!("request unauthorized after re-authentication");
                    return Err(ExecError::Auth(AuthError::AuthenticationExpired));
                }
                Err(err) if err.is_transient() && self.retry.allows_retry(retries) => {
                    let delay = self.retry.delay(retries);
                    retries += 1;
                    debug!(
                        error = %err,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
