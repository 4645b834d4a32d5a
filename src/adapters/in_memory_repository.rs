//! In-memory session repository for testing.
//!
//! This adapter provides a pure in-memory implementation of
//! SessionRepository, enabling fast tests without any file system I/O.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use crate::{Result, error::Error, ports::SessionRepository, session::SavedSession};

/// In-memory repository for testing.
///
/// Stores sessions as MessagePack bytes in a shared map. Clones share the
/// same underlying storage and are safe to pass across threads.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently stored.
    pub fn count(&self) -> usize {
        self.storage.lock().unwrap().len()
    }

    /// Remove all stored sessions.
    pub fn clear(&self) {
        self.storage.lock().unwrap().clear();
    }

    /// Check whether a session exists at the given path.
    pub fn contains(&self, path: &Path) -> bool {
        let key = path.to_string_lossy().to_string();
        self.storage.lock().unwrap().contains_key(&key)
    }
}

impl SessionRepository for InMemoryRepository {
    fn save(&self, session: &SavedSession, path: &Path) -> Result<()> {
        let key = path.to_string_lossy().to_string();

        let bytes = rmp_serde::to_vec(session).map_err(|e| Error::SerializationContext {
            operation: "serialize session for in-memory storage".to_string(),
            message: e.to_string(),
        })?;

        self.storage.lock().unwrap().insert(key, bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedSession> {
        let key = path.to_string_lossy().to_string();
        let storage = self.storage.lock().unwrap();

        let bytes = storage.get(&key).ok_or_else(|| Error::Io {
            operation: format!("load session from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;

        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize session from in-memory storage".to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::TrainingParameters,
        grid::{Grid, GridWorld, RewardConfig},
        learning::{Algorithm, QTable, Strategy},
        session::SavedSession,
        types::{Action, Position},
    };

    fn sample_session() -> SavedSession {
        let grid = Grid::new(3).unwrap();
        let env = GridWorld::new(grid, Position::new(0, 0), Position::new(2, 2)).unwrap();
        let mut q = QTable::new(env.num_states());
        q.set(0, Action::Down, 1.25);
        SavedSession::capture(
            &env,
            &q,
            Algorithm::Sarsa,
            Strategy::Boltzmann,
            TrainingParameters::default(),
            RewardConfig::default(),
        )
    }

    #[test]
    fn test_in_memory_save_and_load() {
        let repo = InMemoryRepository::new();
        let session = sample_session();
        let path = Path::new("test_session");

        assert_eq!(repo.count(), 0);
        assert!(!repo.contains(path));

        repo.save(&session, path).unwrap();
        assert_eq!(repo.count(), 1);
        assert!(repo.contains(path));

        let loaded = repo.load(path).unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = InMemoryRepository::new();
        assert!(repo.load(Path::new("nonexistent")).is_err());
    }

    #[test]
    fn test_clone_shares_storage() {
        let repo1 = InMemoryRepository::new();
        let repo2 = repo1.clone();

        let session = sample_session();
        repo1.save(&session, Path::new("shared")).unwrap();

        let loaded = repo2.load(Path::new("shared")).unwrap();
        assert_eq!(loaded, session);
        assert_eq!(repo1.count(), 1);
        assert_eq!(repo2.count(), 1);
    }
}
