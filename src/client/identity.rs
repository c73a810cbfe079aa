// src/client/identity.rs

//! The player's local identity: a backend user id plus a display name.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::client::{api::QuizBackend, error::ClientError};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<i64>,
    pub display_name: Option<String>,
}

/// Where the identity survives between runs.
pub trait IdentityStore: Send + Sync {
    fn load(&self) -> Result<Identity, ClientError>;
    fn save(&self, identity: &Identity) -> Result<(), ClientError>;
}

#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    identity: RwLock<Identity>,
}

impl MemoryIdentityStore {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity: RwLock::new(identity),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Result<Identity, ClientError> {
        self.identity
            .read()
            .map(|i| i.clone())
            .map_err(|_| ClientError::Storage("identity lock poisoned".to_string()))
    }

    fn save(&self, identity: &Identity) -> Result<(), ClientError> {
        let mut guard = self
            .identity
            .write()
            .map_err(|_| ClientError::Storage("identity lock poisoned".to_string()))?;
        *guard = identity.clone();
        Ok(())
    }
}

/// JSON file store. A missing file reads as an empty identity.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Identity, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Identity::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, identity: &Identity) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Write then rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(identity)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Keeps the stored identity in step with the backend's user record.
pub struct IdentityManager {
    backend: Arc<dyn QuizBackend>,
    store: Arc<dyn IdentityStore>,
}

impl IdentityManager {
    pub fn new(backend: Arc<dyn QuizBackend>, store: Arc<dyn IdentityStore>) -> Self {
        Self { backend, store }
    }

    pub fn identity(&self) -> Result<Identity, ClientError> {
        self.store.load()
    }

    /// The id to attribute attempts to, if one was ever assigned.
    pub fn user_id(&self) -> Result<Option<i64>, ClientError> {
        Ok(self.store.load()?.user_id)
    }

    /// True until the player has chosen a display name.
    pub fn needs_name(&self) -> Result<bool, ClientError> {
        Ok(self.store.load()?.display_name.is_none())
    }

    /// Sets the display name and registers or renames the backend user.
    ///
    /// The name is trimmed; an empty name is rejected without any effect.
    /// Without a stored id a user is created, otherwise it is renamed; a
    /// stored id the backend no longer knows is replaced by a new user.
    /// The name is stored locally even if the backend is unreachable.
    pub async fn register_name(&self, name: &str) -> Result<Identity, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::InvalidState(
                "display name must not be empty".to_string(),
            ));
        }

        let mut identity = self.store.load()?;
        identity.display_name = Some(name.to_string());

        match self.sync_user(identity.user_id, name).await {
            Ok(user_id) => identity.user_id = Some(user_id),
            Err(e) => tracing::warn!("Could not register player name with the server: {}", e),
        }

        self.store.save(&identity)?;
        Ok(identity)
    }

    async fn sync_user(&self, user_id: Option<i64>, name: &str) -> Result<i64, ClientError> {
        let Some(id) = user_id else {
            return Ok(self.backend.create_user(name).await?.id);
        };

        match self.backend.update_user(id, name).await {
            Ok(user) => Ok(user.id),
            Err(e) if e.is_not_found() => {
                tracing::info!("Stored user {} is unknown to the server, creating a new one", id);
                Ok(self.backend.create_user(name).await?.id)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{ScriptedBackend, UserCall, sample_quiz};

    fn manager(backend: &Arc<ScriptedBackend>) -> (IdentityManager, Arc<MemoryIdentityStore>) {
        let store = Arc::new(MemoryIdentityStore::default());
        (IdentityManager::new(backend.clone(), store.clone()), store)
    }

    #[tokio::test]
    async fn first_name_creates_then_rename_updates() {
        let backend = Arc::new(ScriptedBackend::new(sample_quiz(1, 1)));
        let (manager, _) = manager(&backend);
        assert!(manager.needs_name().unwrap());

        let first = manager.register_name("  Fan1 ").await.unwrap();
        assert_eq!(first.display_name.as_deref(), Some("Fan1"));
        let id = first.user_id.unwrap();

        let second = manager.register_name("Fan2").await.unwrap();
        assert_eq!(second.user_id, Some(id));
        assert!(!manager.needs_name().unwrap());

        assert_eq!(
            backend.user_calls(),
            vec![
                UserCall::Create("Fan1".to_string()),
                UserCall::Update(id, "Fan2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn blank_name_is_rejected_without_calls() {
        let backend = Arc::new(ScriptedBackend::new(sample_quiz(1, 1)));
        let (manager, store) = manager(&backend);

        assert!(manager.register_name("   ").await.is_err());
        assert!(backend.user_calls().is_empty());
        assert_eq!(store.load().unwrap(), Identity::default());
    }

    #[tokio::test]
    async fn stale_id_is_replaced() {
        let backend = Arc::new(ScriptedBackend::new(sample_quiz(1, 1)));
        backend.forget_user(77);
        let store = Arc::new(MemoryIdentityStore::new(Identity {
            user_id: Some(77),
            display_name: Some("Old".to_string()),
        }));
        let manager = IdentityManager::new(backend.clone(), store);

        let identity = manager.register_name("New").await.unwrap();
        assert!(identity.user_id.is_some_and(|id| id != 77));
        assert_eq!(backend.user_calls().len(), 2);
    }

    #[tokio::test]
    async fn name_is_kept_when_backend_is_down() {
        let backend = Arc::new(ScriptedBackend::new(sample_quiz(1, 1)));
        backend.set_users_down(true);
        let (manager, store) = manager(&backend);

        let identity = manager.register_name("Fan1").await.unwrap();
        assert_eq!(identity.user_id, None);
        assert_eq!(store.load().unwrap().display_name.as_deref(), Some("Fan1"));
    }

    #[test]
    fn file_store_round_trips_and_defaults_when_missing() {
        let dir = std::env::temp_dir().join(format!("oshi-quiz-{}", uuid::Uuid::new_v4()));
        let store = FileIdentityStore::new(dir.join("identity.json"));

        assert_eq!(store.load().unwrap(), Identity::default());

        let identity = Identity {
            user_id: Some(4),
            display_name: Some("Fan".to_string()),
        };
        store.save(&identity).unwrap();
        assert_eq!(store.load().unwrap(), identity);

        fs::remove_dir_all(&dir).ok();
    }
}
