//! Mariner client: authentication and session-token lifecycle.
//!
//! The pieces compose like this:
//!
//! - [`session::SessionState`] is the single in-memory session slot; every
//!   request reads its bearer token from there at send time.
//! - [`repository::AuthRepository`] is the state machine: login, logout,
//!   startup restore, and the single-flight token refresh.
//! - [`factory::ClientFactory`] caches one HTTP handle per canonical server
//!   identity and is invalidated whenever the token rotates.
//! - [`executor::RequestExecutor`] wraps calls with one-shot
//!   re-authentication and bounded transient retry.
//! - [`service::AuthService`] wires it all together for the UI layer.

pub mod config;
pub mod executor;
pub mod factory;
pub mod prefs;
pub mod repository;
pub mod service;
pub mod session;
pub mod transport;

pub use config::{AuthConfig, HttpConfig};
pub use executor::{Reauthenticator, RequestExecutor};
pub use factory::{ClientFactory, ClientHandle};
pub use prefs::{PreferenceError, PreferenceStore, ServerPreferences};
pub use repository::{AuthRepository, AuthState};
pub use service::AuthService;
pub use session::{SessionState, TokenProvider};
pub use transport::{AuthApi, AuthResponse, HttpAuthApi};
