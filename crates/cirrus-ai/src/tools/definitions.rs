//! The six cloud-file tools offered to the model.

use serde_json::{Value, json};

use super::traits::{BackendKind, ToolSchema};

/// A known tool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ListDriveFiles,
    SearchDriveFiles,
    ReadDriveFile,
    ListOneDriveFiles,
    SearchOneDriveFiles,
    ReadOneDriveFile,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::ListDriveFiles,
        ToolKind::SearchDriveFiles,
        ToolKind::ReadDriveFile,
        ToolKind::ListOneDriveFiles,
        ToolKind::SearchOneDriveFiles,
        ToolKind::ReadOneDriveFile,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::ListDriveFiles => "list_drive_files",
            ToolKind::SearchDriveFiles => "search_drive_files",
            ToolKind::ReadDriveFile => "read_drive_file",
            ToolKind::ListOneDriveFiles => "list_onedrive_files",
            ToolKind::SearchOneDriveFiles => "search_onedrive_files",
            ToolKind::ReadOneDriveFile => "read_onedrive_file",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn backend(self) -> BackendKind {
        match self {
            ToolKind::ListDriveFiles | ToolKind::SearchDriveFiles | ToolKind::ReadDriveFile => {
                BackendKind::GoogleDrive
            }
            ToolKind::ListOneDriveFiles
            | ToolKind::SearchOneDriveFiles
            | ToolKind::ReadOneDriveFile => BackendKind::OneDrive,
        }
    }

    /// Status line shown to the user right before the backend call.
    pub fn progress_message(self) -> &'static str {
        match self {
            ToolKind::ListDriveFiles => "Browsing Drive files...",
            ToolKind::SearchDriveFiles => "Searching Drive...",
            ToolKind::ReadDriveFile => "Reading file...",
            ToolKind::ListOneDriveFiles => "Browsing OneDrive files...",
            ToolKind::SearchOneDriveFiles => "Searching OneDrive...",
            ToolKind::ReadOneDriveFile => "Reading OneDrive file...",
        }
    }

    pub fn schema(self) -> ToolSchema {
        let (description, parameters) = match self {
            ToolKind::ListDriveFiles => (
                "List files in Google Drive. Optionally pass a folder_id to list the contents of that folder.",
                json!({
                    "type": "object",
                    "properties": {
                        "folder_id": {
                            "type": "string",
                            "description": "Folder id to list. Omit or use \"root\" for the top-level folder."
                        }
                    }
                }),
            ),
            ToolKind::SearchDriveFiles => (
                "Search Google Drive for files whose name contains the query.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "Text to look for in file names." }
                    },
                    "required": ["query"]
                }),
            ),
            ToolKind::ReadDriveFile => (
                "Read the text content of a Google Drive file. Google Docs, Sheets and Slides are exported as text.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_id": { "type": "string", "description": "Id of the file to read." },
                        "export": {
                            "type": "boolean",
                            "description": "Prefer exporting Google-native files instead of downloading them."
                        }
                    },
                    "required": ["file_id"]
                }),
            ),
            ToolKind::ListOneDriveFiles => (
                "List files in OneDrive or SharePoint. With no folder and no drive context, lists the accessible sites and drives.",
                onedrive_parameters(
                    json!({
                        "folder_id": { "type": "string", "description": "Folder item id to list. Omit for the drive root." }
                    }),
                    &[],
                ),
            ),
            ToolKind::SearchOneDriveFiles => (
                "Search OneDrive or SharePoint for files matching the query.",
                onedrive_parameters(
                    json!({
                        "query": { "type": "string", "description": "Search text." }
                    }),
                    &["query"],
                ),
            ),
            ToolKind::ReadOneDriveFile => (
                "Read the text content of a OneDrive or SharePoint file.",
                onedrive_parameters(
                    json!({
                        "item_id": { "type": "string", "description": "Id of the item to read." }
                    }),
                    &["item_id"],
                ),
            ),
        };
        ToolSchema::new(self.name(), description, parameters)
    }
}

/// Adds the optional drive/site/user context every OneDrive tool accepts.
fn onedrive_parameters(mut properties: Value, required: &[&str]) -> Value {
    if let Some(map) = properties.as_object_mut() {
        map.insert(
            "drive_id".to_string(),
            json!({ "type": "string", "description": "Drive id. Takes precedence over site_id and user_id." }),
        );
        map.insert(
            "site_id".to_string(),
            json!({ "type": "string", "description": "SharePoint site id; its default document library is used." }),
        );
        map.insert(
            "user_id".to_string(),
            json!({ "type": "string", "description": "User id or principal name; that user's OneDrive is used." }),
        );
    }
    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("delete_everything"), None);
    }

    #[test]
    fn test_onedrive_schemas_accept_location_context() {
        for kind in [
            ToolKind::ListOneDriveFiles,
            ToolKind::SearchOneDriveFiles,
            ToolKind::ReadOneDriveFile,
        ] {
            let schema = kind.schema();
            let props = schema.parameters["properties"].as_object().unwrap();
            assert!(props.contains_key("drive_id"));
            assert!(props.contains_key("site_id"));
            assert!(props.contains_key("user_id"));
        }
        let read = ToolKind::ReadOneDriveFile.schema();
        assert_eq!(read.parameters["required"], json!(["item_id"]));
        let list = ToolKind::ListOneDriveFiles.schema();
        assert!(list.parameters.get("required").is_none());
    }
}
