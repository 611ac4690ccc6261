//! Authentication state machine.
//!
//! Owns every transition between logged-out and logged-in, including the
//! single-flight token refresh. Two rules shape all the code here:
//!
//! 1. At most one refresh runs at a time. Concurrent callers that hit an
//!    expired token attach to the in-flight refresh instead of starting
//!    their own, and all of them observe its result.
//! 2. Stored credentials are deleted only when the server confirms they are
//!    wrong, or the user logs out. A refresh that fails because the network
//!    or the server is down keeps both the credential and the old session,
//!    so recovery after an outage needs no user action.

use std::sync::Arc;

use mariner_common::{CredentialError, CredentialStore};
use mariner_domain::{AuthError, ServerIdentity, Session};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::config::AuthConfig;
use crate::factory::ClientFactory;
use crate::prefs::{PreferenceStore, ServerPreferences};
use crate::session::SessionState;
use crate::transport::AuthApi;

/// Observable authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    Authenticating,
    Authenticated,
    Refreshing,
    /// Logged out because the server rejected the credential; carries the
    /// rejection so the UI can explain why re-login is needed.
    LoggedOutFailed(AuthError),
}

/// Credential kept in memory for the lifetime of the session so the refresh
/// path can re-authenticate without touching the key store.
#[derive(Clone)]
struct ActiveCredential {
    username: String,
    password: String,
}

type RefreshOutcome = Option<Result<(), AuthError>>;

pub struct AuthRepository {
    api: Arc<dyn AuthApi>,
    session: Arc<SessionState>,
    credentials: Arc<CredentialStore>,
    prefs: Arc<PreferenceStore>,
    factory: Arc<ClientFactory>,
    config: AuthConfig,
    active: Mutex<Option<ActiveCredential>>,
    state_tx: watch::Sender<AuthState>,
    /// Slot for the in-flight refresh; `Some` while one is running.
    inflight: Mutex<Option<watch::Receiver<RefreshOutcome>>>,
}

impl AuthRepository {
    #[must_use]
    pub fn new(
        api: Arc<dyn AuthApi>,
        session: Arc<SessionState>,
        credentials: Arc<CredentialStore>,
        prefs: Arc<PreferenceStore>,
        factory: Arc<ClientFactory>,
        config: AuthConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(AuthState::LoggedOut);
        Self {
            api,
            session,
            credentials,
            prefs,
            factory,
            config,
            active: Mutex::new(None),
            state_tx,
            inflight: Mutex::new(None),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, state: AuthState) {
        self.state_tx.send_replace(state);
    }

    /// Log into `server` with the given credentials.
    ///
    /// On success the session is installed and, when `remember_me` is set,
    /// the credential is persisted. A key store that refuses the write
    /// degrades the login to session-only rather than failing it.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`] when the server rejects the pair
    /// (any previously stored credential for it is deleted); transient
    /// errors leave stored credentials untouched.
    #[instrument(skip(self, password), fields(server = %server, username = %username))]
    pub async fn login(
        &self,
        server: ServerIdentity,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<(), AuthError> {
        self.set_state(AuthState::Authenticating);

        let response = match self.api.login(&server, username, password).await {
            Ok(response) => response,
            Err(err @ AuthError::InvalidCredentials(_)) => {
                // Confirmed rejection: a remembered credential for this pair
                // is now known-bad.
                if let Err(e) = self.credentials.delete(&server, username).await {
                    warn!(error = %e, "failed to delete rejected credential");
                }
                self.set_state(AuthState::LoggedOutFailed(err.clone()));
                return Err(err);
            }
            Err(err) => {
                self.set_state(AuthState::LoggedOut);
                return Err(err);
            }
        };

        let session = Session::new(server.clone(), response.user_id, response.access_token);
        self.session.replace(Some(session)).await;
        self.factory.invalidate(&server);

        *self.active.lock().await = Some(ActiveCredential {
            username: username.to_string(),
            password: password.to_string(),
        });
        if remember_me {
            match self.credentials.save(&server, username, password).await {
                Ok(()) => {}
                Err(CredentialError::EncryptionUnavailable(msg)) => {
                    // Session-only degraded mode: login succeeds, the next
                    // start will just require typing the password again.
                    warn!(error = %msg, "key store unavailable, credential not persisted");
                }
                Err(e) => warn!(error = %e, "failed to persist credential"),
            }
            let prefs = ServerPreferences {
                server: server.clone(),
                username: username.to_string(),
                remember_me,
            };
            if let Err(e) = self.prefs.save(&prefs).await {
                warn!(error = %e, "failed to persist preferences");
            }
        }

        self.set_state(AuthState::Authenticated);
        info!(server = %server, "login succeeded");
        Ok(())
    }

    /// Log out, clearing the session and any remembered credential.
    ///
    /// # Errors
    /// [`AuthError::EncryptionUnavailable`] when the key store refuses the
    /// deletion; the in-memory session is cleared regardless.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let session = self.session.current().await;
        let active = self.active.lock().await.take();

        self.session.replace(None).await;
        if let Some(session) = &session {
            self.factory.invalidate(&session.server);
        }
        self.set_state(AuthState::LoggedOut);

        let mut result = Ok(());
        if let (Some(session), Some(active)) = (&session, &active) {
            if let Err(e) = self.credentials.delete(&session.server, &active.username).await {
                warn!(error = %e, "failed to delete stored credential on logout");
                result = Err(AuthError::EncryptionUnavailable(e.to_string()));
            }
        }
        if let Err(e) = self.prefs.clear().await {
            warn!(error = %e, "failed to clear preferences on logout");
        }

        info!("logged out");
        result
    }

    /// Restore the previous session from persisted preferences and the
    /// credential store. Returns `Ok(false)` when there is nothing to
    /// restore.
    ///
    /// # Errors
    /// Propagates login failures; an unreadable key store is reported as
    /// [`AuthError::EncryptionUnavailable`] without clearing anything.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<bool, AuthError> {
        let prefs = match self.prefs.load().await {
            Ok(Some(prefs)) => prefs,
            Ok(None) => {
                debug!("no stored preferences; starting logged out");
                return Ok(false);
            }
            Err(e) => {
                // An unreadable preference file must not block startup, but
                // it is not the same as "nothing remembered".
                warn!(error = %e, "failed to read preferences; starting logged out");
                return Ok(false);
            }
        };
        if !prefs.remember_me {
            return Ok(false);
        }

        let password = match self.credentials.load(&prefs.server, &prefs.username).await {
            Ok(password) => password,
            Err(CredentialError::NotFound) => {
                debug!(server = %prefs.server, "preferences present but no stored credential");
                return Ok(false);
            }
            Err(CredentialError::EncryptionUnavailable(msg)) => {
                // Do not delete anything: the credential may be fine once
                // the key store is reachable again.
                warn!(error = %msg, "key store unavailable during bootstrap");
                return Err(AuthError::EncryptionUnavailable(msg));
            }
        };

        self.login(prefs.server, &prefs.username, &password, true).await?;
        Ok(true)
    }

    /// Whether the current token is close enough to expiry to warrant a
    /// proactive refresh.
    ///
    /// TODO: prefer the server-reported `expires_in` from the login
    /// response over the configured lifetime when it is present.
    pub async fn is_near_expiry(&self) -> bool {
        match self.session.current().await {
            Some(session) => session.issued_at.elapsed() >= self.config.near_expiry_age(),
            None => false,
        }
    }

    /// Refresh the session token, coalescing concurrent callers onto a
    /// single in-flight attempt.
    ///
    /// The actual work runs on a spawned task so that a caller giving up
    /// (request timeout, dropped future) cannot abort a refresh other
    /// callers are waiting on.
    ///
    /// # Errors
    /// [`AuthError::NotLoggedIn`] without a session;
    /// [`AuthError::InvalidCredentials`] when the server rejects the stored
    /// credential (session and credential are cleared); transient errors
    /// keep the old token so a later attempt can still succeed.
    pub async fn refresh(self: &Arc<Self>) -> Result<(), AuthError> {
        let mut rx = {
            let mut inflight = self.inflight.lock().await;
            if let Some(rx) = inflight.as_ref() {
                debug!("joining in-flight refresh");
                rx.clone()
            } else {
                let (tx, rx) = watch::channel(None);
                *inflight = Some(rx.clone());
                let repo = Arc::clone(self);
                tokio::spawn(async move {
                    let result = repo.run_refresh().await;
                    // Clear the slot before broadcasting so a caller woken
                    // by the result that immediately retries starts a new
                    // refresh instead of attaching to this finished one.
                    *repo.inflight.lock().await = None;
                    let _ = tx.send(Some(result));
                });
                rx
            }
        };

        let outcome = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| AuthError::ServerError("refresh task aborted".to_string()))?;
        (*outcome).clone().unwrap_or(Err(AuthError::NotLoggedIn))
    }

    /// The refresh body; runs exactly once per in-flight slot.
    async fn run_refresh(&self) -> Result<(), AuthError> {
        let Some(session) = self.session.current().await else {
            return Err(AuthError::NotLoggedIn);
        };
        let Some(credential) = self.active.lock().await.clone() else {
            return Err(AuthError::NotLoggedIn);
        };

        self.set_state(AuthState::Refreshing);
        let server = session.server.clone();
        debug!(server = %server, "refreshing session token");

        match self.api.login(&server, &credential.username, &credential.password).await {
            Ok(response) => {
                let rotated = self.session.rotate_token(response.access_token).await;
                self.factory.invalidate(&server);
                if rotated {
                    self.set_state(AuthState::Authenticated);
                    info!(server = %server, "session token refreshed");
                    Ok(())
                } else {
                    // Logout raced the refresh; stay logged out.
                    self.set_state(AuthState::LoggedOut);
                    Err(AuthError::NotLoggedIn)
                }
            }
            Err(err @ AuthError::InvalidCredentials(_)) => {
                // The credential the session was built from is now rejected.
                // Clear everything derived from it.
                self.session.replace(None).await;
                self.factory.invalidate(&server);
                self.active.lock().await.take();
                if let Err(e) = self.credentials.delete(&server, &credential.username).await {
                    warn!(error = %e, "failed to delete rejected credential");
                }
                self.set_state(AuthState::LoggedOutFailed(err.clone()));
                warn!(server = %server, "stored credential rejected during refresh");
                Err(err)
            }
            Err(err) => {
                // Transient: the old token may still work, and the stored
                // credential is not at fault. Keep both.
                if self.session.is_authenticated().await {
                    self.set_state(AuthState::Authenticated);
                } else {
                    self.set_state(AuthState::LoggedOut);
                }
                warn!(server = %server, error = %err, "refresh failed transiently");
                Err(err)
            }
        }
    }

    /// Refresh only when the token is near expiry. A no-op otherwise.
    pub async fn refresh_if_near_expiry(self: &Arc<Self>) -> Result<(), AuthError> {
        if self.is_near_expiry().await {
            self.refresh().await
        } else {
            Ok(())
        }
    }

    /// Spawn the background task that refreshes proactively near expiry.
    /// Abort the returned handle to stop it.
    pub fn start_auto_refresh(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let repo = Arc::clone(self);
        let period = self.config.refresh_check_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                if let Err(e) = repo.refresh_if_near_expiry().await {
                    // Transient failures will be retried on the next tick;
                    // credential rejections already moved the state machine
                    // to LoggedOutFailed.
                    warn!(error = %e, "background refresh failed");
                }
            }
        })
    }

    #[cfg(test)]
    pub(crate) fn test_config(&self) -> &AuthConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use mariner_common::MemorySecretStore;
    use tokio::sync::Mutex as AsyncMutex;

    use super::*;
    use crate::config::HttpConfig;
    use crate::transport::AuthResponse;

    /// Scripted auth API: pops one result per login call.
    struct ScriptedApi {
        script: AsyncMutex<Vec<Result<AuthResponse, AuthError>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedApi {
        fn new(script: Vec<Result<AuthResponse, AuthError>>) -> Self {
            Self { script: AsyncMutex::new(script), calls: AtomicUsize::new(0), delay: Duration::ZERO }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn ok_response(token: &str) -> Result<AuthResponse, AuthError> {
        Ok(AuthResponse {
            access_token: token.to_string(),
            user_id: "u-1".to_string(),
            expires_in: Some(3600),
        })
    }

    #[async_trait]
    impl AuthApi for ScriptedApi {
        async fn login(
            &self,
            _server: &ServerIdentity,
            _username: &str,
            _password: &str,
        ) -> Result<AuthResponse, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let mut script = self.script.lock().await;
            if script.is_empty() {
                return Err(AuthError::ServerError("script exhausted".to_string()));
            }
            script.remove(0)
        }
    }

    struct Fixture {
        repo: Arc<AuthRepository>,
        api: Arc<ScriptedApi>,
        session: Arc<SessionState>,
        secrets: Arc<MemorySecretStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture(api: ScriptedApi) -> Fixture {
        fixture_with_config(api, AuthConfig::default())
    }

    fn fixture_with_config(api: ScriptedApi, config: AuthConfig) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let prefs_path = dir.path().join("prefs.json");
        fixture_with_prefs_path(api, config, prefs_path, dir)
    }

    fn fixture_with_prefs_path(
        api: ScriptedApi,
        config: AuthConfig,
        prefs_path: std::path::PathBuf,
        dir: tempfile::TempDir,
    ) -> Fixture {
        let api = Arc::new(api);
        let session = Arc::new(SessionState::new());
        let secrets = Arc::new(MemorySecretStore::new());
        let credentials = Arc::new(CredentialStore::new(secrets.clone()));
        let prefs = Arc::new(PreferenceStore::new(prefs_path));
        let factory =
            Arc::new(ClientFactory::new(HttpConfig::default(), session.clone()).unwrap());
        let repo = Arc::new(AuthRepository::new(
            api.clone(),
            session.clone(),
            credentials,
            prefs,
            factory,
            config,
        ));
        Fixture { repo, api, session, secrets, _dir: dir }
    }

    fn server() -> ServerIdentity {
        ServerIdentity::parse("https://media.example.com").unwrap()
    }

    #[tokio::test]
    async fn login_installs_session_and_persists_credential() {
        let f = fixture(ScriptedApi::new(vec![ok_response("tok-1")]));

        f.repo.login(server(), "alice", "pw", true).await.unwrap();

        assert_eq!(f.repo.state(), AuthState::Authenticated);
        let session = f.session.current().await.unwrap();
        assert_eq!(session.access_token, "tok-1");
        assert_eq!(session.user_id, "u-1");
        assert_eq!(f.secrets.len(), 1);
    }

    #[tokio::test]
    async fn login_without_remember_me_stores_nothing() {
        let f = fixture(ScriptedApi::new(vec![ok_response("tok-1")]));
        f.repo.login(server(), "alice", "pw", false).await.unwrap();
        assert!(f.secrets.is_empty());
    }

    #[tokio::test]
    async fn rejected_login_deletes_stored_credential() {
        let f = fixture(ScriptedApi::new(vec![
            ok_response("tok-1"),
            Err(AuthError::InvalidCredentials("rejected".to_string())),
        ]));

        f.repo.login(server(), "alice", "old-pw", true).await.unwrap();
        assert_eq!(f.secrets.len(), 1);

        let err = f.repo.login(server(), "alice", "bad-pw", true).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
        assert!(f.secrets.is_empty());
        assert!(matches!(f.repo.state(), AuthState::LoggedOutFailed(_)));
    }

    #[tokio::test]
    async fn transient_login_failure_keeps_stored_credential() {
        let f = fixture(ScriptedApi::new(vec![
            ok_response("tok-1"),
            Err(AuthError::ServerUnreachable("down".to_string())),
        ]));

        f.repo.login(server(), "alice", "pw", true).await.unwrap();
        let err = f.repo.login(server(), "alice", "pw", true).await.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(f.secrets.len(), 1);
        assert_eq!(f.repo.state(), AuthState::LoggedOut);
    }

    #[tokio::test]
    async fn logout_clears_session_and_credential() {
        let f = fixture(ScriptedApi::new(vec![ok_response("tok-1")]));
        f.repo.login(server(), "alice", "pw", true).await.unwrap();

        f.repo.logout().await.unwrap();

        assert_eq!(f.repo.state(), AuthState::LoggedOut);
        assert!(f.session.current().await.is_none());
        assert!(f.secrets.is_empty());
    }

    #[tokio::test]
    async fn refresh_rotates_token_in_place() {
        let f = fixture(ScriptedApi::new(vec![ok_response("tok-1"), ok_response("tok-2")]));
        f.repo.login(server(), "alice", "pw", true).await.unwrap();

        f.repo.refresh().await.unwrap();

        let session = f.session.current().await.unwrap();
        assert_eq!(session.access_token, "tok-2");
        assert_eq!(f.repo.state(), AuthState::Authenticated);
        assert_eq!(f.api.calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_refreshes_coalesce_into_one_call() {
        let api = ScriptedApi::new(vec![ok_response("tok-1"), ok_response("tok-2")])
            .with_delay(Duration::from_millis(50));
        let f = fixture(api);
        f.repo.login(server(), "alice", "pw", false).await.unwrap();

        let (a, b, c) = tokio::join!(
            f.repo.refresh(),
            f.repo.refresh(),
            f.repo.refresh(),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        // One login call plus exactly one refresh call.
        assert_eq!(f.api.calls(), 2);
        assert_eq!(f.session.current().await.unwrap().access_token, "tok-2");
    }

    #[tokio::test]
    async fn refresh_survives_caller_cancellation() {
        let api = ScriptedApi::new(vec![ok_response("tok-1"), ok_response("tok-2")])
            .with_delay(Duration::from_millis(50));
        let f = fixture(api);
        f.repo.login(server(), "alice", "pw", false).await.unwrap();

        let repo = Arc::clone(&f.repo);
        let caller = tokio::spawn(async move { repo.refresh().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        caller.abort();

        // The spawned refresh keeps running and lands its token.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(f.session.current().await.unwrap().access_token, "tok-2");
    }

    #[tokio::test]
    async fn rejected_refresh_clears_session_and_credential() {
        let f = fixture(ScriptedApi::new(vec![
            ok_response("tok-1"),
            Err(AuthError::InvalidCredentials("password changed".to_string())),
        ]));
        f.repo.login(server(), "alice", "pw", true).await.unwrap();

        let err = f.repo.refresh().await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials(_)));
        assert!(f.session.current().await.is_none());
        assert!(f.secrets.is_empty());
        assert!(matches!(f.repo.state(), AuthState::LoggedOutFailed(_)));
    }

    #[tokio::test]
    async fn transient_refresh_failure_keeps_token_and_credential() {
        let f = fixture(ScriptedApi::new(vec![
            ok_response("tok-1"),
            Err(AuthError::NetworkUnavailable("offline".to_string())),
        ]));
        f.repo.login(server(), "alice", "pw", true).await.unwrap();

        let err = f.repo.refresh().await.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(f.session.current().await.unwrap().access_token, "tok-1");
        assert_eq!(f.secrets.len(), 1);
        assert_eq!(f.repo.state(), AuthState::Authenticated);
    }

    #[tokio::test]
    async fn refresh_without_session_is_not_logged_in() {
        let f = fixture(ScriptedApi::new(vec![]));
        let err = f.repo.refresh().await.unwrap_err();
        assert_eq!(err, AuthError::NotLoggedIn);
        assert_eq!(f.api.calls(), 0);
    }

    #[tokio::test]
    async fn bootstrap_restores_remembered_session() {
        let f = fixture(ScriptedApi::new(vec![ok_response("tok-1"), ok_response("tok-2")]));
        f.repo.login(server(), "alice", "pw", true).await.unwrap();

        // Simulate a restart: same stores, fresh state machine.
        f.session.replace(None).await;
        f.repo.active.lock().await.take();
        f.repo.set_state(AuthState::LoggedOut);

        assert!(f.repo.bootstrap().await.unwrap());
        assert_eq!(f.repo.state(), AuthState::Authenticated);
        assert_eq!(f.session.current().await.unwrap().access_token, "tok-2");
    }

    #[tokio::test]
    async fn bootstrap_without_preferences_is_a_noop() {
        let f = fixture(ScriptedApi::new(vec![]));
        assert!(!f.repo.bootstrap().await.unwrap());
        assert_eq!(f.repo.state(), AuthState::LoggedOut);
        assert_eq!(f.api.calls(), 0);
    }

    #[tokio::test]
    async fn bootstrap_with_unreadable_preferences_stays_logged_out() {
        // A directory as the preferences path makes the read fail with a
        // genuine I/O error rather than NotFound.
        let dir = tempfile::tempdir().unwrap();
        let prefs_path = dir.path().to_path_buf();
        let f = fixture_with_prefs_path(
            ScriptedApi::new(vec![]),
            AuthConfig::default(),
            prefs_path,
            dir,
        );

        assert!(!f.repo.bootstrap().await.unwrap());
        assert_eq!(f.repo.state(), AuthState::LoggedOut);
        assert_eq!(f.api.calls(), 0);
    }

    #[tokio::test]
    async fn near_expiry_honors_configured_margin() {
        let config = AuthConfig {
            token_lifetime: Duration::from_millis(100),
            refresh_margin: Duration::from_millis(90),
            ..AuthConfig::default()
        };
        let f = fixture_with_config(
            ScriptedApi::new(vec![ok_response("tok-1")]),
            config,
        );
        f.repo.login(server(), "alice", "pw", false).await.unwrap();

        assert!(!f.repo.is_near_expiry().await);
        tokio::time::sleep(f.repo.test_config().near_expiry_age() + Duration::from_millis(5)).await;
        assert!(f.repo.is_near_expiry().await);
    }

    #[tokio::test]
    async fn refresh_if_near_expiry_skips_fresh_tokens() {
        let f = fixture(ScriptedApi::new(vec![ok_response("tok-1")]));
        f.repo.login(server(), "alice", "pw", false).await.unwrap();

        f.repo.refresh_if_near_expiry().await.unwrap();

        assert_eq!(f.api.calls(), 1);
        assert_eq!(f.session.current().await.unwrap().access_token, "tok-1");
    }

    #[tokio::test]
    async fn state_stream_reports_transitions() {
        let f = fixture(ScriptedApi::new(vec![ok_response("tok-1"), ok_response("tok-2")]));
        let mut rx = f.repo.subscribe_state();
        assert_eq!(*rx.borrow_and_update(), AuthState::LoggedOut);

        f.repo.login(server(), "alice", "pw", false).await.unwrap();
        assert_eq!(*rx.borrow_and_update(), AuthState::Authenticated);

        f.repo.refresh().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), AuthState::Authenticated);

        f.repo.logout().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), AuthState::LoggedOut);
    }
}
