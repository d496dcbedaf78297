//! Google Drive backend authenticated with a service account.
//!
//! A self-signed RS256 assertion is exchanged for a read-only bearer token,
//! which is cached until a minute before it expires. Google-native documents
//! are exported as text; everything else is downloaded and run through
//! [`extract_text`](crate::extraction::extract_text).

use std::path::Path;

use async_trait::async_trait;
use cirrus_ai::build_http_client;
use cirrus_ai::tools::{
    BackendKind, DriveLocation, ReadOptions, Result, StorageBackend, ToolError, cap_read_content,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::extraction::extract_text;
use crate::http::{CONTENT_TIMEOUT, METADATA_TIMEOUT, TOKEN_TIMEOUT, ensure_success};
use crate::token_cache::{IssuedToken, TokenCache};

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const FILE_FIELDS: &str = "id,name,mimeType,size,modifiedTime,webViewLink,parents";
const GOOGLE_NATIVE_PREFIX: &str = "application/vnd.google-apps";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Service account key file contents. Only the fields used for signing are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .unwrap_or(DEFAULT_TOKEN_URI)
    }

    /// Signed JWT assertion for the token exchange.
    fn signed_assertion(&self, now: i64) -> Result<String> {
        let (Some(client_email), Some(private_key)) = (
            self.client_email.as_deref().filter(|s| !s.is_empty()),
            self.private_key.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(ToolError::Auth("Invalid service account JSON.".to_string()));
        };

        let claims = AssertionClaims {
            iss: client_email,
            scope: DRIVE_READONLY_SCOPE,
            aud: self.token_uri(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .map_err(|e| ToolError::Auth(format!("Invalid service account private key: {e}")))?;

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| ToolError::Auth(format!("Failed to sign token request: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata {
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    web_view_link: Option<String>,
}

enum ReadAttempt {
    Export(&'static str),
    Download,
}

/// Google Drive storage backend
pub struct GoogleDriveBackend {
    client: Client,
    key: Option<ServiceAccountKey>,
    api_base: String,
    tokens: TokenCache,
}

impl GoogleDriveBackend {
    pub fn new(key: Option<ServiceAccountKey>) -> Self {
        Self {
            client: build_http_client(),
            key,
            api_base: DRIVE_API_BASE.to_string(),
            tokens: TokenCache::new(),
        }
    }

    /// Load the key file at `path`. An unreadable file leaves the backend unconfigured.
    pub fn from_service_account_file(path: Option<&Path>) -> Self {
        let key = path.and_then(|path| match ServiceAccountKey::from_file(path) {
            Ok(key) => Some(key),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to load service account");
                None
            }
        });
        Self::new(key)
    }

    /// Override the Drive API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    async fn access_token(&self) -> Result<String> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| ToolError::NotConfigured("No Google service account configured.".to_string()))?;
        self.tokens.get_or_refresh(|| self.request_token(key)).await
    }

    async fn request_token(&self, key: &ServiceAccountKey) -> Result<IssuedToken> {
        let assertion = key.signed_assertion(chrono::Utc::now().timestamp())?;
        let response = self
            .client
            .post(key.token_uri())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await?;

        let body = response.text().await?;
        let parsed: Option<TokenResponse> = serde_json::from_str(&body).ok();
        match parsed {
            Some(TokenResponse {
                access_token: Some(token),
                expires_in,
                ..
            }) if !token.is_empty() => Ok(IssuedToken::new(token, expires_in)),
            Some(TokenResponse {
                error_description: Some(description),
                ..
            }) => Err(ToolError::Auth(description)),
            _ => Err(ToolError::Auth("Failed to get Google access token.".to_string())),
        }
    }

    /// GET with the bearer token. A 401 drops the cached token so the next call re-authenticates.
    async fn authorized_get(&self, url: &str, timeout: std::time::Duration) -> Result<Response> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .timeout(timeout)
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Drive rejected the access token");
            self.tokens.invalidate().await;
        }
        Ok(response)
    }

    /// Run a `files.list` query and return the raw response body.
    async fn list_query(&self, query: &str) -> Result<String> {
        let url = format!(
            "{}/files?q={}&fields={}&pageSize=100&orderBy=modifiedTime+desc&supportsAllDrives=true&includeItemsFromAllDrives=true&corpora=allDrives",
            self.api_base,
            urlencoding::encode(query),
            urlencoding::encode(&format!("files({FILE_FIELDS})")),
        );
        let response = ensure_success(self.authorized_get(&url, METADATA_TIMEOUT).await?).await?;
        Ok(response.text().await?)
    }

    async fn metadata(&self, file_id: &str) -> Result<FileMetadata> {
        let url = format!(
            "{}/files/{}?fields={}&supportsAllDrives=true",
            self.api_base,
            urlencoding::encode(file_id),
            urlencoding::encode(FILE_FIELDS),
        );
        let response = ensure_success(self.authorized_get(&url, METADATA_TIMEOUT).await?).await?;
        Ok(response.json().await?)
    }

    fn read_attempts(mime_type: &str, prefer_export: bool) -> Vec<ReadAttempt> {
        let mut attempts = Vec::with_capacity(3);
        if mime_type.starts_with(GOOGLE_NATIVE_PREFIX) || prefer_export {
            if mime_type == SPREADSHEET_MIME {
                attempts.push(ReadAttempt::Export("text/csv"));
            }
            attempts.push(ReadAttempt::Export("text/plain"));
        }
        attempts.push(ReadAttempt::Download);
        attempts
    }
}

#[async_trait]
impl StorageBackend for GoogleDriveBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GoogleDrive
    }

    fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    async fn list_files(
        &self,
        folder_id: Option<&str>,
        _location: &DriveLocation,
    ) -> Result<String> {
        // Files inside a folder shared with the service account are not
        // themselves "shared with me", so the unscoped listing covers everything.
        let query = match folder_id {
            Some(folder) => format!("'{}' in parents and trashed=false", folder.replace('\'', "\\'")),
            None => "trashed=false".to_string(),
        };
        debug!(folder = ?folder_id, "Listing Drive files");
        self.list_query(&query).await
    }

    async fn search_files(&self, query: &str, _location: &DriveLocation) -> Result<String> {
        let escaped = query.replace('\'', "\\'");
        debug!(query, "Searching Drive");
        self.list_query(&format!("trashed=false and name contains '{escaped}'"))
            .await
    }

    async fn read_file(&self, file_id: &str, options: &ReadOptions) -> Result<String> {
        let metadata = self.metadata(file_id).await?;
        let web_view_link = metadata
            .web_view_link
            .clone()
            .filter(|link| !link.is_empty())
            .unwrap_or_else(|| format!("https://drive.google.com/open?id={file_id}"));
        let encoded_id = urlencoding::encode(file_id);

        let mut text = None;
        for attempt in Self::read_attempts(&metadata.mime_type, options.prefer_export) {
            match attempt {
                ReadAttempt::Export(mime) => {
                    let url = format!(
                        "{}/files/{encoded_id}/export?mimeType={}",
                        self.api_base,
                        urlencoding::encode(mime)
                    );
                    let response = self.authorized_get(&url, CONTENT_TIMEOUT).await?;
                    let status = response.status();
                    if matches!(
                        status,
                        StatusCode::BAD_REQUEST
                            | StatusCode::FORBIDDEN
                            | StatusCode::UNSUPPORTED_MEDIA_TYPE
                    ) {
                        debug!(file_id, mime, %status, "Export rejected, trying next mode");
                        continue;
                    }
                    text = Some(ensure_success(response).await?.text().await?);
                }
                ReadAttempt::Download => {
                    let url = format!(
                        "{}/files/{encoded_id}?alt=media&supportsAllDrives=true",
                        self.api_base
                    );
                    let response =
                        ensure_success(self.authorized_get(&url, CONTENT_TIMEOUT).await?).await?;
                    let bytes = response.bytes().await?;
                    let mime = metadata.mime_type.clone();
                    let name = metadata.name.clone();
                    let extracted =
                        tokio::task::spawn_blocking(move || extract_text(&bytes, &mime, &name))
                            .await
                            .map_err(|e| ToolError::Extraction(e.to_string()))?;
                    text = Some(extracted.ok_or_else(|| {
                        ToolError::Extraction("Could not extract readable text from file.".to_string())
                    })?);
                }
            }
            break;
        }

        let text = text.ok_or_else(|| ToolError::Unavailable("Could not read file.".to_string()))?;

        let payload = json!({
            "file": {
                "id": file_id,
                "name": metadata.name,
                "mimeType": metadata.mime_type,
                "webViewLink": web_view_link,
            },
            "content": cap_read_content(&text),
        });
        Ok(payload.to_string())
    }
}
