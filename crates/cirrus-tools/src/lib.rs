//! Cloud storage backends for Cirrus.
//!
//! This crate provides:
//! - Google Drive access through a service account (`GoogleDriveBackend`)
//! - OneDrive / SharePoint access through Microsoft Graph (`OneDriveBackend`)
//! - Bearer-token caching shared by both backends
//! - Text extraction for downloaded files (plain text, PDF, DOCX)
//!
//! The `StorageBackend` trait and the tool registry that dispatches to these
//! backends live in `cirrus-ai` and are re-exported here for convenience.

pub mod extraction;
pub mod google_drive;
mod http;
pub mod onedrive;
pub mod token_cache;

pub use cirrus_ai::tools::{
    BackendKind, DriveLocation, ReadOptions, Result, StorageBackend, ToolError, ToolRegistry,
};

pub use extraction::extract_text;
pub use google_drive::{GoogleDriveBackend, ServiceAccountKey};
pub use onedrive::{OneDriveBackend, OneDriveCredentials};
pub use token_cache::{IssuedToken, TokenCache};
