use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::access::{PageKey, RoleTemplates};
use crate::api::UserRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access local file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse local file: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSession {
    pub token: String,
    pub user: UserRecord,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(token: String, user: UserRecord) -> Self {
        Self {
            token,
            user,
            saved_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct StoredTemplates {
    viewer: Vec<PageKey>,
}

/// Files kept beside the config: the signed-in session, the e-mail to pre-fill
/// on the login form and the last known viewer template.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join("session.json")
    }

    fn remembered_path(&self) -> PathBuf {
        self.dir.join("remembered_email")
    }

    fn templates_path(&self) -> PathBuf {
        self.dir.join("role_defaults.json")
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn remove(path: &Path) -> Result<(), StoreError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_session(&self, session: &StoredSession) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(session)?;
        self.write(&self.session_path(), &json)
    }

    /// `Ok(None)` when nobody is signed in.
    pub fn load_session(&self) -> Result<Option<StoredSession>, StoreError> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn clear_session(&self) -> Result<(), StoreError> {
        Self::remove(&self.session_path())
    }

    pub fn remember_email(&self, email: &str) -> Result<(), StoreError> {
        self.write(&self.remembered_path(), email.trim())
    }

    pub fn forget_email(&self) -> Result<(), StoreError> {
        Self::remove(&self.remembered_path())
    }

    pub fn remembered_email(&self) -> Option<String> {
        std::fs::read_to_string(self.remembered_path())
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn save_templates(&self, templates: &RoleTemplates) -> Result<(), StoreError> {
        let stored = StoredTemplates {
            viewer: templates.viewer.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        self.write(&self.templates_path(), &json)
    }

    /// A missing or unreadable template file is treated as absent.
    pub fn load_templates(&self) -> Option<RoleTemplates> {
        let content = std::fs::read_to_string(self.templates_path()).ok()?;
        match serde_json::from_str::<StoredTemplates>(&content) {
            Ok(stored) => Some(RoleTemplates::new(stored.viewer)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable role defaults: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_test_user() -> UserRecord {
        UserRecord {
            id: "u_1".to_string(),
            name: "Lan".to_string(),
            email: "lan@clinic.vn".to_string(),
            role: "viewer".to_string(),
            permissions: None,
            active: Some(true),
            created_at: None,
        }
    }

    #[test]
    fn session_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("clinic-desk"));
        let session = StoredSession::new("tok".to_string(), create_test_user());

        store.save_session(&session).unwrap();

        assert_eq!(store.load_session().unwrap(), Some(session));
    }

    #[test]
    fn missing_session_is_none() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        assert_eq!(store.load_session().unwrap(), None);
    }

    #[test]
    fn corrupt_session_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("session.json"), "{not json").unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());

        assert!(matches!(store.load_session(), Err(StoreError::ParseError(_))));
    }

    #[test]
    fn clearing_twice_is_fine() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        store
            .save_session(&StoredSession::new("tok".to_string(), create_test_user()))
            .unwrap();

        store.clear_session().unwrap();
        store.clear_session().unwrap();

        assert_eq!(store.load_session().unwrap(), None);
    }

    #[test]
    fn remembers_only_the_email() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());

        store.remember_email(" lan@clinic.vn ").unwrap();
        assert_eq!(store.remembered_email().as_deref(), Some("lan@clinic.vn"));

        store.forget_email().unwrap();
        assert_eq!(store.remembered_email(), None);
    }

    #[test]
    fn templates_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        let templates = RoleTemplates::new([PageKey::Reports, PageKey::Calendar]);

        store.save_templates(&templates).unwrap();

        assert_eq!(store.load_templates(), Some(templates));
    }

    #[test]
    fn unreadable_templates_are_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("role_defaults.json"), "[]").unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());

        assert_eq!(store.load_templates(), None);
    }
}
