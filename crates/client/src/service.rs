//! Top-level auth service.
//!
//! Owns the wiring between the session slot, the credential store, the
//! client factory, the state machine, and the request executor, and exposes
//! the few operations a UI layer needs. Everything behind this facade is
//! reachable for composition, but typical callers stop here.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use mariner_common::{CredentialStore, KeyringStore, RetryStrategy, SecretStore};
use mariner_domain::{AuthError, ExecError, ServerIdentity, Session};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use crate::config::{AuthConfig, HttpConfig};
use crate::executor::{RepositoryReauth, RequestExecutor};
use crate::factory::ClientFactory;
use crate::prefs::PreferenceStore;
use crate::repository::{AuthRepository, AuthState};
use crate::session::SessionState;
use crate::transport::{AuthApi, HttpAuthApi};

pub struct AuthService {
    session: Arc<SessionState>,
    factory: Arc<ClientFactory>,
    repo: Arc<AuthRepository>,
    executor: RequestExecutor,
}

impl AuthService {
    /// Production wiring: platform keychain, HTTP transport, default retry.
    ///
    /// # Errors
    /// [`ExecError::Config`] when the HTTP configuration produces an
    /// unbuildable client.
    pub fn new(
        auth_config: AuthConfig,
        http_config: HttpConfig,
        prefs_path: PathBuf,
    ) -> Result<Self, ExecError> {
        let api: Arc<dyn AuthApi> = Arc::new(HttpAuthApi::new(&http_config)?);
        let secrets: Arc<dyn SecretStore> =
            Arc::new(KeyringStore::new(auth_config.keychain_service.clone()));
        Self::with_parts(
            api,
            secrets,
            prefs_path,
            auth_config,
            http_config,
            RetryStrategy::default(),
        )
    }

    /// Assemble the service from explicit parts. Tests inject an in-memory
    /// secret store and a scripted or wiremock-backed transport here.
    ///
    /// # Errors
    /// [`ExecError::Config`] when the HTTP configuration produces an
    /// unbuildable client.
    pub fn with_parts(
        api: Arc<dyn AuthApi>,
        secrets: Arc<dyn SecretStore>,
        prefs_path: PathBuf,
        auth_config: AuthConfig,
        http_config: HttpConfig,
        retry: RetryStrategy,
    ) -> Result<Self, ExecError> {
        let session = Arc::new(SessionState::new());
        let factory = Arc::new(ClientFactory::new(http_config, session.clone())?);
        let repo = Arc::new(AuthRepository::new(
            api,
            Arc::clone(&session),
            Arc::new(CredentialStore::new(secrets)),
            Arc::new(PreferenceStore::new(prefs_path)),
            Arc::clone(&factory),
            auth_config,
        ));
        let executor =
            RequestExecutor::new(Arc::new(RepositoryReauth::new(Arc::clone(&repo))), retry);
        Ok(Self { session, factory, repo, executor })
    }

    /// Log into a server given its address as the user typed it.
    ///
    /// # Errors
    /// [`AuthError::InvalidServerUrl`] for unparseable addresses, otherwise
    /// the login outcome.
    pub async fn login(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<(), AuthError> {
        let server = ServerIdentity::parse(server_url)?;
        self.repo.login(server, username, password, remember_me).await
    }

    /// Log out and forget the remembered credential.
    ///
    /// # Errors
    /// See [`AuthRepository::logout`].
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.repo.logout().await
    }

    /// Restore the previous session at startup. `Ok(false)` means nothing
    /// was remembered.
    ///
    /// # Errors
    /// See [`AuthRepository::bootstrap`].
    pub async fn bootstrap(&self) -> Result<bool, AuthError> {
        self.repo.bootstrap().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    /// Stream of authenticated-state changes, for UI routing.
    pub fn subscribe_authenticated(&self) -> watch::Receiver<bool> {
        self.session.subscribe()
    }

    pub fn auth_state(&self) -> AuthState {
        self.repo.state()
    }

    pub fn subscribe_auth_state(&self) -> watch::Receiver<AuthState> {
        self.repo.subscribe_state()
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.session.current().await
    }

    pub async fn current_server(&self) -> Option<ServerIdentity> {
        self.session.server().await
    }

    /// Spawn the proactive near-expiry refresh loop.
    pub fn start_auto_refresh(&self) -> tokio::task::JoinHandle<()> {
        self.repo.start_auto_refresh()
    }

    /// Run an arbitrary operation with re-auth and transient retry.
    ///
    /// # Errors
    /// See [`RequestExecutor::execute`].
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T, ExecError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ExecError>>,
    {
        self.executor.execute(op).await
    }

    /// GET a JSON resource from the current server, with full recovery
    /// semantics. The client handle is re-acquired on every attempt so a
    /// refresh-driven invalidation takes effect mid-execution.
    ///
    /// # Errors
    /// [`ExecError::Auth`] with [`AuthError::NotLoggedIn`] when no session
    /// exists; otherwise see [`RequestExecutor::execute`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ExecError> {
        self.executor
            .execute(|| async {
                let server = self.require_server().await?;
                self.factory.client_for(&server).get_json(path).await
            })
            .await
    }

    /// POST a JSON body to the current server, with full recovery
    /// semantics.
    ///
    /// # Errors
    /// Same as [`Self::get_json`].
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ExecError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.executor
            .execute(|| async {
                let server = self.require_server().await?;
                self.factory.client_for(&server).post_json(path, body).await
            })
            .await
    }

    async fn require_server(&self) -> Result<ServerIdentity, ExecError> {
        self.session
            .server()
            .await
            .ok_or(ExecError::Auth(AuthError::NotLoggedIn))
    }
}
