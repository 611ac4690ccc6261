//! Per-server HTTP client handles.
//!
//! Handles are cached by canonical [`ServerIdentity`] only. Nothing
//! session-scoped is baked into a handle: the bearer token is read from the
//! [`TokenProvider`] at send time, so a rotated token reaches requests that
//! were already holding a handle. The cache is still explicitly invalidated
//! on rotation and logout so no handle outlives the session that produced
//! its derived state.

use std::sync::Arc;

use dashmap::DashMap;
use mariner_domain::{ExecError, ServerIdentity};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::HttpConfig;
use crate::session::TokenProvider;

/// Builds and caches [`ClientHandle`]s, one per server identity.
pub struct ClientFactory {
    http: reqwest::Client,
    config: HttpConfig,
    tokens: Arc<dyn TokenProvider>,
    handles: DashMap<ServerIdentity, Arc<ClientHandle>>,
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ClientFactory {
    /// Build the factory and its underlying HTTP client.
    ///
    /// # Errors
    /// [`ExecError::Config`] when the configuration produces an unbuildable
    /// client (e.g. an invalid user-agent header).
    pub fn new(config: HttpConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, ExecError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| ExecError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self { http, config, tokens, handles: DashMap::new() })
    }

    /// Handle for the given server, building and caching one if needed.
    #[must_use]
    pub fn client_for(&self, server: &ServerIdentity) -> Arc<ClientHandle> {
        if let Some(handle) = self.handles.get(server) {
            return Arc::clone(&handle);
        }
        let handle = Arc::new(ClientHandle {
            http: self.http.clone(),
            base_url: server.base_url(),
            config: self.config.clone(),
            tokens: Arc::clone(&self.tokens),
        });
        self.handles.insert(server.clone(), Arc::clone(&handle));
        debug!(server = %server, "built client handle");
        handle
    }

    /// Drop the cached handle for a server. Idempotent; the next
    /// [`Self::client_for`] builds a fresh one.
    pub fn invalidate(&self, server: &ServerIdentity) {
        if self.handles.remove(server).is_some() {
            debug!(server = %server, "invalidated client handle");
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_handle_count(&self) -> usize {
        self.handles.len()
    }
}

/// Authenticated HTTP access to a single server.
pub struct ClientHandle {
    http: reqwest::Client,
    base_url: String,
    config: HttpConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl ClientHandle {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn map_send_error(&self, err: reqwest::Error) -> ExecError {
        if err.is_timeout() {
            ExecError::Timeout(self.config.request_timeout)
        } else {
            ExecError::Network(err.without_url().to_string())
        }
    }

    async fn bearer(&self) -> Result<String, ExecError> {
        self.tokens.access_token().await.ok_or(ExecError::Unauthorized)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ExecError> {
        let status = response.status();
        match status {
            s if s.is_success() => Ok(response),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                trace!(status = %status, "request rejected as unauthorized");
                Err(ExecError::Unauthorized)
            }
            s if s.is_server_error() => {
                Err(ExecError::Server(format!("server returned status {s}")))
            }
            s => Err(ExecError::Client(format!("request failed with status {s}"))),
        }
    }

    /// GET `path` and decode the JSON body. The bearer token is read at
    /// call time.
    ///
    /// # Errors
    /// [`ExecError::Unauthorized`] when no session exists or the server
    /// rejects the token; transport and status failures per the error
    /// taxonomy.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ExecError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.check(response)
            .await?
            .json()
            .await
            .map_err(|e| ExecError::Server(format!("malformed response body: {e}")))
    }

    /// POST a JSON `body` to `path` and decode the JSON response.
    ///
    /// # Errors
    /// Same taxonomy as [`Self::get_json`].
    pub async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ExecError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.check(response)
            .await?
            .json()
            .await
            .map_err(|e| ExecError::Server(format!("malformed response body: {e}")))
    }

}
