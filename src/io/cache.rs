use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::model::task::Tasks;
use crate::model::user::Users;
use crate::ops::task_ops::{tasks_from_value, users_from_value};

const TASKS_SLOT: &str = "tasks.json";
const USERS_SLOT: &str = "users.json";

/// Error type for cache writes (reads never fail, see [`LocalCache::load_tasks`])
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("could not write cache slot {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not create cache directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("could not serialize cache slot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Session mirror of the task and user collections: two whole-document JSON
/// slots in one directory.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    /// Open (and create if needed) the cache directory.
    pub fn open(dir: &Path) -> Result<Self, CacheError> {
        fs::create_dir_all(dir).map_err(|source| CacheError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(LocalCache {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The cached task collection. Missing or corrupt reads as empty.
    pub fn load_tasks(&self) -> Tasks {
        tasks_from_value(self.read_slot(TASKS_SLOT))
    }

    /// Overwrite the whole task slot.
    pub fn save_tasks(&self, tasks: &Tasks) -> Result<(), CacheError> {
        self.write_slot(TASKS_SLOT, tasks)
    }

    /// The cached user collection. Missing or corrupt reads as empty.
    pub fn load_users(&self) -> Users {
        users_from_value(self.read_slot(USERS_SLOT))
    }

    pub fn save_users(&self, users: &Users) -> Result<(), CacheError> {
        self.write_slot(USERS_SLOT, users)
    }

    fn read_slot(&self, slot: &str) -> Option<Value> {
        let path = self.dir.join(slot);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable cache slot, treating as empty");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache slot, treating as empty");
                None
            }
        }
    }

    fn write_slot<T: Serialize>(&self, slot: &str, value: &T) -> Result<(), CacheError> {
        let path = self.dir.join(slot);
        let content = serde_json::to_vec(value)?;
        self.replace_slot(&path, &content)
            .map_err(|source| CacheError::WriteError { path, source })
    }

    /// Whole-slot overwrite: write a sibling temp file, then rename it over the slot.
    fn replace_slot(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(content)?;
        staged.as_file().sync_all()?;
        staged.persist(path)?;
        Ok(())
    }
}
