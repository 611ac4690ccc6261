//! Persisted connection preferences.
//!
//! A small JSON file remembering which server and account were last used, so
//! startup can restore the session without asking the user. The secret
//! itself never lands here; it lives in the credential store.

use std::io;
use std::path::PathBuf;

use mariner_domain::ServerIdentity;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Preference persistence failures.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to read preferences: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write preferences: {0}")]
    Write(#[source] io::Error),

    #[error("failed to encode preferences: {0}")]
    Encode(#[source] serde_json::Error),
}

/// What we remember between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPreferences {
    pub server: ServerIdentity,
    pub username: String,
    /// Whether the user opted into credential persistence.
    pub remember_me: bool,
}

/// JSON-file-backed preference store.
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load preferences, returning `None` when the file is absent or
    /// unparseable. A corrupt file is logged and treated as absent rather
    /// than blocking startup.
    pub async fn load(&self) -> Result<Option<ServerPreferences>, PreferenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PreferenceError::Read(e)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(prefs) => Ok(Some(prefs)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt preferences file");
                Ok(None)
            }
        }
    }

    /// Persist preferences, replacing any previous file.
    ///
    /// # Errors
    /// I/O and encoding failures; the caller decides whether these are
    /// fatal.
    pub async fn save(&self, prefs: &ServerPreferences) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(PreferenceError::Write)?;
        }
        let bytes = serde_json::to_vec_pretty(prefs).map_err(PreferenceError::Encode)?;
        tokio::fs::write(&self.path, bytes).await.map_err(PreferenceError::Write)?;
        debug!(path = %self.path.display(), server = %prefs.server, "saved preferences");
        Ok(())
    }

    /// Remove the preferences file (idempotent).
    pub async fn clear(&self) -> Result<(), PreferenceError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PreferenceError::Write(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> ServerPreferences {
        ServerPreferences {
            server: ServerIdentity::parse("https://media.example.com").unwrap(),
            username: "alice".to_string(),
            remember_me: true,
        }
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));

        store.save(&prefs()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(prefs()));
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreadable_path_is_an_error_not_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().to_path_buf());

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, PreferenceError::Read(_)));
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = PreferenceStore::new(path);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));

        store.clear().await.unwrap();
        store.save(&prefs()).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }
}
