//! Durable storage for the session store.
//!
//! The whole store is rewritten as one JSON document on every mutation.
//! Writes go through a temp file in the same directory followed by an atomic
//! rename, so a reader never observes a partial write. A missing or
//! malformed file at startup yields an empty store rather than an error.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::core::session::{Session, SessionStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    sessions: Vec<Session>,
    #[serde(default)]
    theme: Option<String>,
}

pub struct StorePersistence {
    path: PathBuf,
}

impl StorePersistence {
    pub fn at_default_location() -> Self {
        let proj_dirs = ProjectDirs::from("org", "permacommons", "mathmate")
            .expect("Failed to determine data directory");
        Self {
            path: proj_dirs.data_dir().join("store.json"),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the store and theme preference. Any failure resets to empty.
    pub fn load(&self) -> (SessionStore, Option<String>) {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return (SessionStore::new(), None),
        };
        match serde_json::from_str::<StoreFile>(&contents) {
            Ok(file) => {
                let active = file
                    .sessions
                    .iter()
                    .max_by_key(|s| s.last_modified)
                    .map(|s| s.id.clone());
                (SessionStore::from_sessions(file.sessions, active), file.theme)
            }
            Err(e) => {
                warn!(path = %self.path.display(), "discarding malformed store: {e}");
                (SessionStore::new(), None)
            }
        }
    }

    /// Persist the full store. Last writer wins.
    pub fn save(
        &self,
        store: &SessionStore,
        theme: Option<&str>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let file = StoreFile {
            sessions: store.sessions.clone(),
            theme: theme.map(str::to_string),
        };
        let contents = serde_json::to_string_pretty(&file)?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut temp_file = NamedTempFile::new_in(&parent)?;
        temp_file.write_all(contents.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&self.path)?;
        Ok(())
    }
}
