//! In-memory session state.
//!
//! The single source of truth for "who are we logged in as, and with what
//! token". Everything that sends an authenticated request reads the token
//! from here at the moment of sending; nothing caches a copy. That is what
//! makes a token rotation take effect for every in-flight caller without a
//! restart.

use async_trait::async_trait;
use mariner_domain::{ServerIdentity, Session};
use tokio::sync::{watch, RwLock};
use tracing::debug;

/// Read-side seam for the current access token.
///
/// Implementors must return the token as of *now*, never a cached value, so
/// retried requests after a refresh pick up the rotated token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// Shared, lock-protected session slot plus an authenticated-state stream.
pub struct SessionState {
    inner: RwLock<Option<Session>>,
    authenticated_tx: watch::Sender<bool>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        let (authenticated_tx, _) = watch::channel(false);
        Self { inner: RwLock::new(None), authenticated_tx }
    }

    /// Snapshot of the current session, if any.
    pub async fn current(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    /// Identity of the server we are logged into, if any.
    pub async fn server(&self) -> Option<ServerIdentity> {
        self.inner.read().await.as_ref().map(|s| s.server.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Subscribe to authenticated-state changes. The receiver yields the
    /// current value immediately and then on every login/logout transition.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated_tx.subscribe()
    }

    /// Install or clear the session.
    pub(crate) async fn replace(&self, session: Option<Session>) {
        let authenticated = session.is_some();
        {
            let mut slot = self.inner.write().await;
            *slot = session;
        }
        // send_replace never fails even with zero receivers.
        self.authenticated_tx.send_replace(authenticated);
        debug!(authenticated, "session state replaced");
    }

    /// Swap in a freshly rotated token, leaving identity untouched.
    ///
    /// Returns false when no session exists (e.g. logout raced the refresh),
    /// in which case the token is dropped rather than resurrecting a
    /// logged-out session.
    pub(crate) async fn rotate_token(&self, access_token: String) -> bool {
        let mut slot = self.inner.write().await;
        match slot.as_mut() {
            Some(session) => {
                session.rotate_token(access_token);
                debug!(user_id = %session.user_id, "session token rotated");
                true
            }
            None => {
                debug!("token rotation skipped: no active session");
                false
            }
        }
    }
}

#[async_trait]
impl TokenProvider for SessionState {
    async fn access_token(&self) -> Option<String> {
        self.inner.read().await.as_ref().map(|s| s.access_token.clone())
    }
}
