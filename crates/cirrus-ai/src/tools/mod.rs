//! Cloud-file tools - schemas, request parsing and dispatch
//!
//! Backends implement [`StorageBackend`]; the [`ToolRegistry`] decides which
//! tools are offered and routes each parsed [`ToolRequest`] to one backend call.

mod definitions;
mod error;
mod registry;
mod request;
mod traits;

pub use definitions::ToolKind;
pub use error::{Result, ToolError};
pub use registry::ToolRegistry;
pub use request::ToolRequest;
pub use traits::{BackendKind, DriveLocation, ReadOptions, StorageBackend, ToolSchema};

/// Maximum characters of extracted file content returned by a read tool.
pub const READ_CONTENT_MAX_CHARS: usize = 15_000;

/// Appended to file content cut at [`READ_CONTENT_MAX_CHARS`].
pub const READ_TRUNCATION_SUFFIX: &str = "\n\n[...truncated, file too large to show in full]";

/// Cap extracted file content for a read tool result.
pub fn cap_read_content(content: &str) -> String {
    crate::text_utils::truncate_with_suffix(content, READ_CONTENT_MAX_CHARS, READ_TRUNCATION_SUFFIX)
}
