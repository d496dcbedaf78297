//! Tool registry for the configured storage backends

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::Notifier;
use crate::llm::ToolCall;

use super::definitions::ToolKind;
use super::request::ToolRequest;
use super::traits::{BackendKind, DriveLocation, ReadOptions, StorageBackend, ToolSchema};

/// Registry holding the storage backends the model may call into.
///
/// Schemas are only offered for backends that report themselves configured.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    google_drive: Option<Arc<dyn StorageBackend>>,
    onedrive: Option<Arc<dyn StorageBackend>>,
    drive_root_folder: Option<String>,
}

impl ToolRegistry {
    /// Create a registry with no backends
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_google_drive(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.google_drive = Some(backend);
        self
    }

    pub fn with_onedrive(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.onedrive = Some(backend);
        self
    }

    /// Folder used when the model lists Drive without a folder or with `root`.
    pub fn with_drive_root_folder(mut self, folder_id: Option<String>) -> Self {
        self.drive_root_folder = folder_id.filter(|id| !id.trim().is_empty());
        self
    }

    fn backend(&self, kind: BackendKind) -> Option<&Arc<dyn StorageBackend>> {
        let slot = match kind {
            BackendKind::GoogleDrive => self.google_drive.as_ref(),
            BackendKind::OneDrive => self.onedrive.as_ref(),
        };
        slot.filter(|backend| backend.is_configured())
    }

    pub fn is_configured(&self, kind: BackendKind) -> bool {
        self.backend(kind).is_some()
    }

    pub fn drive_root_folder(&self) -> Option<&str> {
        self.drive_root_folder.as_deref()
    }

    /// Tools currently on offer, in a stable order.
    pub fn available(&self) -> Vec<ToolKind> {
        ToolKind::ALL
            .into_iter()
            .filter(|kind| self.is_configured(kind.backend()))
            .collect()
    }

    /// Check if a tool is on offer
    pub fn has(&self, name: &str) -> bool {
        ToolKind::from_name(name).is_some_and(|kind| self.is_configured(kind.backend()))
    }

    /// Get schemas for all offered tools
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.available().into_iter().map(ToolKind::schema).collect()
    }

    /// Execute one tool call and render its outcome as the tool message text.
    ///
    /// Never fails: unknown tools, missing arguments and backend errors all
    /// come back as text for the model to read.
    pub async fn dispatch(&self, call: &ToolCall, notify: &Notifier) -> String {
        let request = ToolRequest::parse(&call.name, &call.arguments);
        debug!(tool = %call.name, call_id = %call.id, "Dispatching tool call");

        let kind = match &request {
            ToolRequest::Unknown(name) => return format!("Unknown tool: {name}"),
            ToolRequest::MissingArgument { argument, .. } => {
                return format!("Error: Missing required {argument}.");
            }
            other => match other.kind() {
                Some(kind) => kind,
                None => return format!("Unknown tool: {}", call.name),
            },
        };

        let Some(backend) = self.backend(kind.backend()) else {
            return format!("Error: {} is not configured.", kind.backend().display_name());
        };

        notify(kind.progress_message());

        let result = match request {
            ToolRequest::ListDrive { folder_id } => {
                let folder = self.resolve_drive_folder(folder_id);
                backend
                    .list_files(folder.as_deref(), &DriveLocation::default())
                    .await
            }
            ToolRequest::SearchDrive { query } => {
                backend.search_files(&query, &DriveLocation::default()).await
            }
            ToolRequest::ReadDrive { file_id, export } => {
                let options = ReadOptions {
                    location: DriveLocation::default(),
                    prefer_export: export,
                };
                backend.read_file(&file_id, &options).await
            }
            ToolRequest::ListOneDrive {
                folder_id,
                location,
            } => backend.list_files(folder_id.as_deref(), &location).await,
            ToolRequest::SearchOneDrive { query, location } => {
                backend.search_files(&query, &location).await
            }
            ToolRequest::ReadOneDrive { item_id, location } => {
                let options = ReadOptions {
                    location,
                    prefer_export: false,
                };
                backend.read_file(&item_id, &options).await
            }
            ToolRequest::MissingArgument { .. } | ToolRequest::Unknown(_) => {
                return format!("Unknown tool: {}", call.name);
            }
        };

        match result {
            Ok(payload) => payload,
            Err(err) => {
                warn!(tool = %call.name, error = %err, "Tool call failed");
                format!("Error: {err}")
            }
        }
    }

    fn resolve_drive_folder(&self, folder_id: Option<String>) -> Option<String> {
        match folder_id.as_deref() {
            None | Some("root") => self.drive_root_folder.clone().or(folder_id),
            Some(_) => folder_id,
        }
    }
}
