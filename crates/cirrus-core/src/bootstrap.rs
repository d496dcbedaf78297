//! Wiring from configuration to a ready chat session.

use std::sync::Arc;

use anyhow::Result;
use cirrus_ai::{DriveLocation, OpenAIClient, ToolRegistry};
use cirrus_storage::Storage;
use cirrus_tools::{GoogleDriveBackend, OneDriveBackend, OneDriveCredentials};
use tracing::info;

use crate::config::AppConfig;
use crate::session::ChatSession;

/// Completion client for the configured provider. A missing key surfaces on the first request.
pub fn llm_client(config: &AppConfig) -> OpenAIClient {
    OpenAIClient::new(config.api_key().unwrap_or_default())
        .with_model(config.model())
        .with_base_url(config.base_url())
        .with_project(config.openai.project.clone())
        .with_organization(config.openai.organization.clone())
}

/// Tool registry holding both backends; each offers tools only when configured.
pub fn tool_registry(config: &AppConfig) -> ToolRegistry {
    let drive = GoogleDriveBackend::from_service_account_file(
        config.google_drive.service_account_file.as_deref(),
    );

    let onedrive = &config.onedrive;
    let onedrive_backend = OneDriveBackend::new(OneDriveCredentials {
        tenant_id: onedrive.tenant_id.clone(),
        client_id: onedrive.client_id.clone(),
        client_secret: onedrive.client_secret.clone(),
    })
    .with_default_location(DriveLocation {
        drive_id: onedrive.drive_id.clone(),
        site_id: onedrive.site_id.clone(),
        user_id: onedrive.user_id.clone(),
    });

    ToolRegistry::new()
        .with_google_drive(Arc::new(drive))
        .with_onedrive(Arc::new(onedrive_backend))
        .with_drive_root_folder(config.google_drive.folder_id.clone())
}

/// Open the database, build the session and restore the saved chat.
///
/// Returns the session and whether a saved chat was restored.
pub async fn open_session(config: &AppConfig) -> Result<(ChatSession, bool)> {
    let storage = Storage::new(config.database_path()?)?;
    let registry = Arc::new(tool_registry(config));
    let session =
        ChatSession::new(Arc::new(llm_client(config)), registry).with_store(storage.chat_state);

    let restored = session.restore().await;
    info!(
        restored,
        drive = session.has_drive(),
        onedrive = session.has_onedrive(),
        model = config.model(),
        "Chat session ready"
    );
    Ok((session, restored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_ai::BackendKind;

    #[test]
    fn test_unconfigured_registry_offers_no_tools() {
        let registry = tool_registry(&AppConfig::default());
        assert!(registry.schemas().is_empty());
        assert!(!registry.is_configured(BackendKind::GoogleDrive));
    }

    #[test]
    fn test_onedrive_credentials_enable_its_tools() {
        let mut config = AppConfig::default();
        config.onedrive.tenant_id = Some("t".to_string());
        config.onedrive.client_id = Some("c".to_string());
        config.onedrive.client_secret = Some("s".to_string());

        let registry = tool_registry(&config);
        assert!(registry.is_configured(BackendKind::OneDrive));
        assert!(registry.has("search_onedrive_files"));
        assert!(!registry.has("list_drive_files"));
    }

    #[test]
    fn test_missing_service_account_file_leaves_drive_off() {
        let mut config = AppConfig::default();
        config.google_drive.service_account_file = Some("/nonexistent/sa.json".into());

        let registry = tool_registry(&config);
        assert!(!registry.is_configured(BackendKind::GoogleDrive));
    }
}
