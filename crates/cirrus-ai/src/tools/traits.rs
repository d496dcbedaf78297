//! Tool schema and storage backend contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::Result;

/// JSON Schema for tool parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value, // JSON Schema object
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Which cloud file system a tool talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    GoogleDrive,
    OneDrive,
}

impl BackendKind {
    pub fn display_name(self) -> &'static str {
        match self {
            BackendKind::GoogleDrive => "Google Drive",
            BackendKind::OneDrive => "OneDrive",
        }
    }
}

/// Secondary container identifiers for backends that address files through a
/// drive, a SharePoint site or a user. Backends without such a model ignore it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveLocation {
    pub drive_id: Option<String>,
    pub site_id: Option<String>,
    pub user_id: Option<String>,
}

impl DriveLocation {
    pub fn is_empty(&self) -> bool {
        self.drive_id.is_none() && self.site_id.is_none() && self.user_id.is_none()
    }

    /// Fill unset identifiers from `defaults`.
    pub fn or(&self, defaults: &DriveLocation) -> DriveLocation {
        DriveLocation {
            drive_id: self.drive_id.clone().or_else(|| defaults.drive_id.clone()),
            site_id: self.site_id.clone().or_else(|| defaults.site_id.clone()),
            user_id: self.user_id.clone().or_else(|| defaults.user_id.clone()),
        }
    }
}

/// Options for reading a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub location: DriveLocation,
    /// Prefer the backend's export mode over a raw download when it has one.
    pub prefer_export: bool,
}

/// A cloud file system exposing list/search/read.
///
/// Every operation returns the JSON text handed back to the model verbatim.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which backend this is
    fn kind(&self) -> BackendKind;

    /// Whether credentials are present; tools are only offered when true.
    fn is_configured(&self) -> bool;

    /// List files inside `folder_id`, or a backend-specific default listing.
    async fn list_files(&self, folder_id: Option<&str>, location: &DriveLocation)
    -> Result<String>;

    /// Search files by name (and content where the backend supports it).
    async fn search_files(&self, query: &str, location: &DriveLocation) -> Result<String>;

    /// Read a file's metadata and extracted text.
    async fn read_file(&self, file_id: &str, options: &ReadOptions) -> Result<String>;
}
