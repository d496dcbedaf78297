//! Cirrus Storage - persistence layer
//!
//! Uses redb as the embedded database. Each storage module owns one table.
//!
//! # Tables
//!
//! - `chat_state` - Current chat and archived chat history

pub mod chat_state;
pub mod paths;
mod simple_storage;

use anyhow::{Context, Result};
use redb::Database;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub use chat_state::{ChatHistoryEntry, ChatState, ChatStateStorage, HISTORY_LIMIT};
pub use simple_storage::SimpleStorage;

/// Central storage manager that initializes all storage subsystems
pub struct Storage {
    db: Arc<Database>,
    pub chat_state: ChatStateStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Arc::new(
            Database::create(path)
                .with_context(|| format!("Failed to open database at {}", path.display()))?,
        );
        let chat_state = ChatStateStorage::new(db.clone())?;
        debug!(path = %path.display(), "Storage opened");

        Ok(Self { db, chat_state })
    }

    /// Open the database in the Cirrus data directory.
    pub fn open_default() -> Result<Self> {
        Self::new(paths::database_path()?)
    }

    /// Get a reference to the underlying database
    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}
