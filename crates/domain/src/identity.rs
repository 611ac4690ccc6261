//! Canonical server identity.
//!
//! Users type server addresses in many shapes (`HTTP://Media.Example.com:443/`,
//! `https://media.example.com/jelly/`). Credentials and cached HTTP clients
//! must be keyed by what the address *means*, not how it was typed, so every
//! address is reduced to a canonical `(scheme, host, port, path)` tuple
//! before it is used as a key anywhere.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::AuthError;

/// Canonical form of a media-server address.
///
/// Construction goes through [`ServerIdentity::parse`], which lowercases the
/// scheme and host, drops a scheme-default port (`:443` for https, `:80` for
/// http), and strips trailing slashes from the path. Canonicalization is
/// pure and idempotent: parsing the rendered form reproduces the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerIdentity {
    scheme: String,
    host: String,
    /// Explicit non-default port, if any.
    port: Option<u16>,
    path: String,
}

impl ServerIdentity {
    /// Parse and canonicalize a server address.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidServerUrl`] if the input is not an
    /// absolute http(s) URL with a host.
    pub fn parse(input: &str) -> Result<Self, AuthError> {
        let url = Url::parse(input.trim())
            .map_err(|e| AuthError::InvalidServerUrl(format!("{input}: {e}")))?;

        let scheme = url.scheme().to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(AuthError::InvalidServerUrl(format!(
                "unsupported scheme '{scheme}' (expected http or https)"
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| AuthError::InvalidServerUrl(format!("{input}: missing host")))?
            .to_ascii_lowercase();

        // `Url::port` already reports None for the scheme's default port.
        let port = url.port();
        let path = url.path().trim_end_matches('/').to_string();

        Ok(Self { scheme, host, port, path })
    }

    /// Base URL for request construction, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}{}", self.scheme, self.host, port, self.path),
            None => format!("{}://{}{}", self.scheme, self.host, self.path),
        }
    }

    /// Stable key for credential-store entries.
    ///
    /// Same shape as [`Self::base_url`]; kept as a separate accessor so
    /// storage keys do not silently change if URL rendering ever does.
    #[must_use]
    pub fn storage_key(&self) -> String {
        self.base_url()
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_default_port_and_trailing_slash() {
        let identity = ServerIdentity::parse("https://media.example.com:443/").unwrap();
        assert_eq!(identity.scheme(), "https");
        assert_eq!(identity.host(), "media.example.com");
        assert_eq!(identity.port(), None);
        assert_eq!(identity.path(), "");
        assert_eq!(identity.base_url(), "https://media.example.com");
    }

    #[test]
    fn keeps_explicit_port() {
        let identity = ServerIdentity::parse("http://media.example.com:8096/").unwrap();
        assert_eq!(identity.port(), Some(8096));
        assert_eq!(identity.base_url(), "http://media.example.com:8096");
    }

    #[test]
    fn lowercases_scheme_and_host() {
        let identity = ServerIdentity::parse("HTTPS://Media.Example.COM/Path").unwrap();
        assert_eq!(identity.base_url(), "https://media.example.com/Path");
    }

    #[test]
    fn differently_typed_urls_map_to_same_identity() {
        let a = ServerIdentity::parse("http://media.example.com:80/jelly/").unwrap();
        let b = ServerIdentity::parse("HTTP://MEDIA.EXAMPLE.COM/jelly").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.storage_key(), b.storage_key());
    }

    #[test]
    fn distinct_ports_are_distinct_identities() {
        let a = ServerIdentity::parse("http://media.example.com:8096").unwrap();
        let b = ServerIdentity::parse("http://media.example.com:8097").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for input in [
            "https://Media.Example.com:443/media///",
            "http://host.example:8096/sub",
            "https://host.example",
        ] {
            let first = ServerIdentity::parse(input).unwrap();
            let second = ServerIdentity::parse(&first.to_string()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn rejects_non_http_schemes() {
        let result = ServerIdentity::parse("ftp://media.example.com");
        assert!(matches!(result, Err(AuthError::InvalidServerUrl(_))));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            ServerIdentity::parse("not a url"),
            Err(AuthError::InvalidServerUrl(_))
        ));
        assert!(matches!(
            ServerIdentity::parse("https://"),
            Err(AuthError::InvalidServerUrl(_))
        ));
    }

    #[test]
    fn preserves_interior_path() {
        let identity = ServerIdentity::parse("https://host.example/sub/dir/").unwrap();
        assert_eq!(identity.path(), "/sub/dir");
        assert_eq!(identity.base_url(), "https://host.example/sub/dir");
    }
}
