//! The in-process session.

use std::time::Instant;

use crate::identity::ServerIdentity;

/// A live authenticated session against one server.
///
/// Exactly one session exists per process, held behind the client crate's
/// `SessionState`. The session never carries the password; credentials live
/// exclusively in the credential store.
///
/// `issued_at` is monotonic (`Instant`, not wall-clock) so near-expiry
/// arithmetic is immune to clock adjustments.
#[derive(Debug, Clone)]
pub struct Session {
    pub server: ServerIdentity,
    pub user_id: String,
    pub access_token: String,
    pub issued_at: Instant,
}

impl Session {
    /// Create a session stamped with the current monotonic time.
    #[must_use]
    pub fn new(server: ServerIdentity, user_id: String, access_token: String) -> Self {
        Self { server, user_id, access_token, issued_at: Instant::now() }
    }

    /// Replace the token in place, resetting `issued_at`.
    ///
    /// Used on refresh; the server and user identity are unchanged.
    pub fn rotate_token(&mut self, access_token: String) {
        self.access_token = access_token;
        self.issued_at = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_token_advances_issued_at() {
        let server = ServerIdentity::parse("https://media.example.com").unwrap();
        let mut session = Session::new(server, "user-1".into(), "token-a".into());
        let before = session.issued_at;

        std::thread::sleep(std::time::Duration::from_millis(5));
        session.rotate_token("token-b".into());

        assert_eq!(session.access_token, "token-b");
        assert!(session.issued_at > before);
        assert_eq!(session.user_id, "user-1");
    }
}
