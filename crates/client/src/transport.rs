//! Wire-level authentication calls.
//!
//! The [`AuthApi`] trait is the seam between the auth state machine and the
//! network; the repository never sees reqwest types, and tests substitute a
//! mock. Credentials flow through here but are never logged and never appear
//! in error text.

use async_trait::async_trait;
use mariner_domain::{AuthError, ExecError, ServerIdentity};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::HttpConfig;

/// Successful login/refresh payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user_id: String,
    /// Server-reported token lifetime in seconds, when present.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Exchange credentials for a session token.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(
        &self,
        server: &ServerIdentity,
        username: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError>;
}

/// HTTP implementation of [`AuthApi`].
#[derive(Debug)]
pub struct HttpAuthApi {
    http: reqwest::Client,
}

impl HttpAuthApi {
    /// Build the transport from the HTTP configuration.
    ///
    /// # Errors
    /// [`ExecError::Config`] when the configuration produces an unbuildable
    /// client.
    pub fn new(config: &HttpConfig) -> Result<Self, ExecError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| ExecError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self { http })
    }
}

fn map_request_error(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::ServerUnreachable("request timed out".to_string())
    } else if err.is_connect() {
        AuthError::ServerUnreachable("connection failed".to_string())
    } else {
        // without_url strips the URL, which may carry query secrets.
        AuthError::NetworkUnavailable(err.without_url().to_string())
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    #[instrument(skip(self, password), fields(server = %server, username = %username))]
    async fn login(
        &self,
        server: &ServerIdentity,
        username: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        let url = format!("{}/auth/login", server.base_url());
        debug!("sending login request");

        let response = self
            .http
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        match status {
            s if s.is_success() => {
                let body: AuthResponse = response.json().await.map_err(|e| {
                    AuthError::ServerError(format!("malformed login response: {e}"))
                })?;
                debug!(user_id = %body.user_id, "login accepted");
                Ok(body)
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                debug!(status = %status, "login rejected");
                Err(AuthError::InvalidCredentials(format!(
                    "server rejected credentials ({status})"
                )))
            }
            s if s.is_server_error() => {
                Err(AuthError::ServerError(format!("login failed with status {s}")))
            }
            s => Err(AuthError::ServerError(format!(
                "unexpected login response status {s}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn api_and_server() -> (HttpAuthApi, MockServer, ServerIdentity) {
        let mock = MockServer::start().await;
        let server = ServerIdentity::parse(&mock.uri()).unwrap();
        (HttpAuthApi::new(&HttpConfig::default()).unwrap(), mock, server)
    }

    #[test]
    fn unbuildable_configuration_is_rejected() {
        let config = HttpConfig {
            user_agent: "bad\nagent".to_string(),
            ..HttpConfig::default()
        };
        let err = HttpAuthApi::new(&config).unwrap_err();
        assert!(matches!(err, ExecError::Config(_)));
    }

    #[tokio::test]
    async fn login_parses_token_response() {
        let (api, mock, server) = api_and_server().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json_string(r#"{"username":"alice","password":"pw"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-1",
                "user_id": "u-1",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&mock)
            .await;

        let response = api.login(&server, "alice", "pw").await.unwrap();
        assert_eq!(response.access_token, "tok-1");
        assert_eq!(response.user_id, "u-1");
        assert_eq!(response.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_invalid_credentials() {
        let (api, mock, server) = api_and_server().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock)
            .await;

        let err = api.login(&server, "alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let (api, mock, server) = api_and_server().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock)
            .await;

        let err = api.login(&server, "alice", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::ServerError(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn rejection_error_never_contains_the_password() {
        let (api, mock, server) = api_and_server().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock)
            .await;

        let err = api.login(&server, "alice", "s3cr3t-pw").await.unwrap_err();
        assert!(!err.to_string().contains("s3cr3t-pw"));
    }
}
