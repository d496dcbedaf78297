//! Application configuration
//!
//! Loads ~/.config/cirrus/config.toml (or an explicit path) and overlays
//! environment variables, which take precedence. Empty values count as unset.

use anyhow::{Context, Result};
use cirrus_ai::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use cirrus_storage::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DATABASE_FILE: &str = "cirrus.db";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub google_drive: GoogleDriveConfig,
    #[serde(default)]
    pub onedrive: OneDriveConfig,
    /// Data directory holding the database and logs
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Completion service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub project: Option<String>,
    pub organization: Option<String>,
}

/// Google Drive service account settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleDriveConfig {
    pub service_account_file: Option<PathBuf>,
    /// Folder listed when the model asks for the Drive root
    pub folder_id: Option<String>,
}

/// Microsoft Graph app registration and default location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneDriveConfig {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub drive_id: Option<String>,
    pub site_id: Option<String>,
    pub user_id: Option<String>,
}

impl AppConfig {
    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cirrus").join("config.toml"))
    }

    /// Load the config file (explicit path or the default one) and apply the
    /// process environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut config = match path {
            Some(path) => Self::load_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load a config file. A missing file yields the defaults.
    ///
    /// A relative service-account path is resolved against the file's directory.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.drop_blank_values();
        if let Some(file) = config.google_drive.service_account_file.as_mut()
            && file.is_relative()
            && let Some(dir) = path.parent()
        {
            *file = dir.join(&*file);
        }
        Ok(config)
    }

    /// Overlay values from `lookup` (normally the process environment).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        override_with(&mut self.openai.api_key, var("OPENAI_API_KEY"));
        override_with(&mut self.openai.model, var("OPENAI_MODEL"));
        override_with(&mut self.openai.base_url, var("OPENAI_BASE_URL"));
        override_with(&mut self.openai.project, var("OPENAI_PROJECT"));
        override_with(&mut self.openai.organization, var("OPENAI_ORGANIZATION"));

        if let Some(file) = var("GOOGLE_SERVICE_ACCOUNT_FILE") {
            self.google_drive.service_account_file = Some(PathBuf::from(file));
        }
        override_with(&mut self.google_drive.folder_id, var("GOOGLE_DRIVE_FOLDER_ID"));

        override_with(&mut self.onedrive.tenant_id, var("MICROSOFT_TENANT_ID"));
        override_with(&mut self.onedrive.client_id, var("MICROSOFT_CLIENT_ID"));
        override_with(&mut self.onedrive.client_secret, var("MICROSOFT_CLIENT_SECRET"));
        override_with(&mut self.onedrive.drive_id, var("MICROSOFT_DRIVE_ID"));
        override_with(&mut self.onedrive.site_id, var("MICROSOFT_SITE_ID"));
        override_with(&mut self.onedrive.user_id, var("MICROSOFT_USER_ID"));

        if let Some(dir) = var(paths::CIRRUS_DIR_ENV) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    fn drop_blank_values(&mut self) {
        for slot in [
            &mut self.openai.api_key,
            &mut self.openai.model,
            &mut self.openai.base_url,
            &mut self.openai.project,
            &mut self.openai.organization,
            &mut self.google_drive.folder_id,
            &mut self.onedrive.tenant_id,
            &mut self.onedrive.client_id,
            &mut self.onedrive.client_secret,
            &mut self.onedrive.drive_id,
            &mut self.onedrive.site_id,
            &mut self.onedrive.user_id,
        ] {
            if slot.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *slot = None;
            }
        }
        if self
            .google_drive
            .service_account_file
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.google_drive.service_account_file = None;
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.openai.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn model(&self) -> &str {
        self.openai.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.openai.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Data directory, created if needed.
    pub fn ensure_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
                Ok(dir.clone())
            }
            None => paths::ensure_cirrus_dir(),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.ensure_data_dir()?.join(DATABASE_FILE))
    }
}

fn override_with(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_file(&dir.path().join("nope.toml")).unwrap();
        assert!(!config.has_api_key());
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.base_url(), "https://api.openai.com");
    }

    #[test]
    fn test_file_values_and_relative_service_account() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[openai]
api_key = "sk-file"
model = "gpt-4o"
project = ""

[google_drive]
service_account_file = "keys/sa.json"
folder_id = "root-folder"

[onedrive]
tenant_id = "tenant"
"#,
        )
        .unwrap();

        let config = AppConfig::load_file(&path).unwrap();
        assert_eq!(config.api_key(), Some("sk-file"));
        assert_eq!(config.model(), "gpt-4o");
        assert!(config.openai.project.is_none());
        assert_eq!(
            config.google_drive.service_account_file,
            Some(dir.path().join("keys/sa.json"))
        );
        assert_eq!(config.google_drive.folder_id.as_deref(), Some("root-folder"));
        assert_eq!(config.onedrive.tenant_id.as_deref(), Some("tenant"));
    }

    #[test]
    fn test_absolute_service_account_path_is_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let absolute = dir.path().join("elsewhere").join("sa.json");
        std::fs::write(
            &path,
            format!(
                "[google_drive]\nservice_account_file = {:?}\n",
                absolute.to_string_lossy()
            ),
        )
        .unwrap();

        let config = AppConfig::load_file(&path).unwrap();
        assert_eq!(config.google_drive.service_account_file, Some(absolute));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[openai\napi_key = 1").unwrap();
        assert!(AppConfig::load_file(&path).is_err());
    }

    #[test]
    fn test_env_overrides_file_and_ignores_blanks() {
        let mut config = AppConfig::default();
        config.openai.api_key = Some("sk-file".to_string());
        config.openai.model = Some("gpt-4o".to_string());

        config.apply_env(env(&[
            ("OPENAI_API_KEY", "sk-env"),
            ("OPENAI_MODEL", "   "),
            ("MICROSOFT_SITE_ID", "site-1"),
            ("GOOGLE_DRIVE_FOLDER_ID", "folder-9"),
            ("CIRRUS_DIR", "/tmp/cirrus-data"),
        ]));

        assert_eq!(config.api_key(), Some("sk-env"));
        assert_eq!(config.model(), "gpt-4o");
        assert_eq!(config.onedrive.site_id.as_deref(), Some("site-1"));
        assert_eq!(config.google_drive.folder_id.as_deref(), Some("folder-9"));
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/cirrus-data")));
    }

    #[test]
    fn test_database_path_uses_data_dir() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            data_dir: Some(dir.path().join("data")),
            ..Default::default()
        };
        let db = config.database_path().unwrap();
        assert_eq!(db, dir.path().join("data").join("cirrus.db"));
        assert!(dir.path().join("data").is_dir());
    }
}
