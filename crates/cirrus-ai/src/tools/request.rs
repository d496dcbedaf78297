//! Parsing of model-issued tool calls into typed requests.

use serde_json::{Map, Value};

use super::definitions::ToolKind;
use super::traits::DriveLocation;

/// A parsed tool call. `match`ing on this is the dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    ListDrive {
        folder_id: Option<String>,
    },
    SearchDrive {
        query: String,
    },
    ReadDrive {
        file_id: String,
        export: bool,
    },
    ListOneDrive {
        folder_id: Option<String>,
        location: DriveLocation,
    },
    SearchOneDrive {
        query: String,
        location: DriveLocation,
    },
    ReadOneDrive {
        item_id: String,
        location: DriveLocation,
    },
    /// A known tool whose required argument is absent.
    MissingArgument {
        kind: ToolKind,
        argument: &'static str,
    },
    Unknown(String),
}

impl ToolRequest {
    /// Parse `(name, raw JSON arguments)`. Unparsable or non-object arguments
    /// are treated as an empty object.
    pub fn parse(name: &str, arguments: &str) -> Self {
        let Some(kind) = ToolKind::from_name(name) else {
            return ToolRequest::Unknown(name.to_string());
        };

        let args = match serde_json::from_str::<Value>(arguments) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        match kind {
            ToolKind::ListDriveFiles => ToolRequest::ListDrive {
                folder_id: string_arg(&args, "folder_id"),
            },
            ToolKind::SearchDriveFiles => match query_arg(&args) {
                Some(query) => ToolRequest::SearchDrive { query },
                None => ToolRequest::missing(kind, "query"),
            },
            ToolKind::ReadDriveFile => match string_arg(&args, "file_id") {
                Some(file_id) => ToolRequest::ReadDrive {
                    file_id,
                    export: args.get("export").is_some_and(is_truthy),
                },
                None => ToolRequest::missing(kind, "file_id"),
            },
            ToolKind::ListOneDriveFiles => ToolRequest::ListOneDrive {
                folder_id: string_arg(&args, "folder_id"),
                location: location_args(&args),
            },
            ToolKind::SearchOneDriveFiles => match query_arg(&args) {
                Some(query) => ToolRequest::SearchOneDrive {
                    query,
                    location: location_args(&args),
                },
                None => ToolRequest::missing(kind, "query"),
            },
            ToolKind::ReadOneDriveFile => match string_arg(&args, "item_id") {
                Some(item_id) => ToolRequest::ReadOneDrive {
                    item_id,
                    location: location_args(&args),
                },
                None => ToolRequest::missing(kind, "item_id"),
            },
        }
    }

    fn missing(kind: ToolKind, argument: &'static str) -> Self {
        ToolRequest::MissingArgument { kind, argument }
    }

    /// The tool this request targets, `None` for unknown names.
    pub fn kind(&self) -> Option<ToolKind> {
        match self {
            ToolRequest::ListDrive { .. } => Some(ToolKind::ListDriveFiles),
            ToolRequest::SearchDrive { .. } => Some(ToolKind::SearchDriveFiles),
            ToolRequest::ReadDrive { .. } => Some(ToolKind::ReadDriveFile),
            ToolRequest::ListOneDrive { .. } => Some(ToolKind::ListOneDriveFiles),
            ToolRequest::SearchOneDrive { .. } => Some(ToolKind::SearchOneDriveFiles),
            ToolRequest::ReadOneDrive { .. } => Some(ToolKind::ReadOneDriveFile),
            ToolRequest::MissingArgument { kind, .. } => Some(*kind),
            ToolRequest::Unknown(_) => None,
        }
    }
}

/// Non-empty string argument. Numbers are accepted as ids.
fn string_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn query_arg(args: &Map<String, Value>) -> Option<String> {
    string_arg(args, "query")
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
}

fn location_args(args: &Map<String, Value>) -> DriveLocation {
    DriveLocation {
        drive_id: string_arg(args, "drive_id"),
        site_id: string_arg(args, "site_id"),
        user_id: string_arg(args, "user_id"),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
