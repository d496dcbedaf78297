//! OneDrive and SharePoint backend over Microsoft Graph.
//!
//! Authenticates with the client-credentials flow. Every drive operation needs
//! a drive base resolved from the call's location, falling back to the
//! configured defaults; without one, listing shows the accessible sites and
//! drives and searching goes through the cross-drive search API.

use async_trait::async_trait;
use cirrus_ai::build_http_client;
use cirrus_ai::tools::{
    BackendKind, DriveLocation, ReadOptions, Result, StorageBackend, ToolError, cap_read_content,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::extraction::extract_text;
use crate::http::{
    CONTENT_TIMEOUT, METADATA_TIMEOUT, TOKEN_TIMEOUT, ensure_success, json_or_api_error,
};
use crate::token_cache::{IssuedToken, TokenCache};

pub const GRAPH_ROOT: &str = "https://graph.microsoft.com/v1.0";
pub const LOGIN_BASE: &str = "https://login.microsoftonline.com";

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
const ITEM_SELECT: &str = "id,name,file,folder,size,lastModifiedDateTime,webUrl,parentReference";
const DRIVE_CONTEXT_HINT: &str = "Provide drive_id/site_id/user_id in the tool call, or set MICROSOFT_DRIVE_ID/MICROSOFT_SITE_ID/MICROSOFT_USER_ID.";
const LOCATIONS_HINT: &str =
    "Use list_onedrive_files with drive_id/site_id/user_id to browse a specific location.";

/// App registration used for the client-credentials flow.
#[derive(Debug, Clone, Default)]
pub struct OneDriveCredentials {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl OneDriveCredentials {
    fn complete(&self) -> Option<(&str, &str, &str)> {
        Some((
            non_empty(&self.tenant_id)?,
            non_empty(&self.client_id)?,
            non_empty(&self.client_secret)?,
        ))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// OneDrive / SharePoint storage backend
pub struct OneDriveBackend {
    client: Client,
    credentials: OneDriveCredentials,
    default_location: DriveLocation,
    graph_root: String,
    login_base: String,
    tokens: TokenCache,
}

impl OneDriveBackend {
    pub fn new(credentials: OneDriveCredentials) -> Self {
        Self {
            client: build_http_client(),
            credentials,
            default_location: DriveLocation::default(),
            graph_root: GRAPH_ROOT.to_string(),
            login_base: LOGIN_BASE.to_string(),
            tokens: TokenCache::new(),
        }
    }

    /// Drive, site or user used when a tool call names none.
    pub fn with_default_location(mut self, location: DriveLocation) -> Self {
        self.default_location = location;
        self
    }

    /// Override the Graph and login endpoints
    pub fn with_endpoints(mut self, graph_root: impl Into<String>, login_base: impl Into<String>) -> Self {
        self.graph_root = graph_root.into().trim_end_matches('/').to_string();
        self.login_base = login_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn access_token(&self) -> Result<String> {
        let (tenant, client_id, secret) = self.credentials.complete().ok_or_else(|| {
            ToolError::NotConfigured(
                "Microsoft OneDrive not configured. Set MICROSOFT_TENANT_ID, MICROSOFT_CLIENT_ID, and MICROSOFT_CLIENT_SECRET."
                    .to_string(),
            )
        })?;
        self.tokens
            .get_or_refresh(|| self.request_token(tenant, client_id, secret))
            .await
    }

    async fn request_token(&self, tenant: &str, client_id: &str, secret: &str) -> Result<IssuedToken> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base,
            urlencoding::encode(tenant)
        );
        let response = self
            .client
            .post(url)
            .form(&[
                ("client_id", client_id),
                ("scope", GRAPH_SCOPE),
                ("client_secret", secret),
                ("grant_type", "client_credentials"),
            ])
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

        if let Some(token) = json["access_token"].as_str().filter(|t| !t.is_empty())
            && status.is_success()
        {
            return Ok(IssuedToken::new(token, json["expires_in"].as_u64()));
        }

        let message = json["error_description"]
            .as_str()
            .or_else(|| json.pointer("/error/message").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "Failed to get Microsoft access token (HTTP {}).",
                    status.as_u16()
                )
            });
        Err(ToolError::Auth(message))
    }

    /// Send with the bearer token. A 401 drops the cached token so the next call re-authenticates.
    async fn send_authorized(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.bearer_auth(self.access_token().await?).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Graph rejected the access token");
            self.tokens.invalidate().await;
        }
        Ok(response)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .send_authorized(self.client.get(url).timeout(METADATA_TIMEOUT))
            .await?;
        json_or_api_error(response).await
    }

    /// Graph URL of the drive addressed by `location`, after applying defaults.
    fn drive_base(&self, location: &DriveLocation) -> Option<String> {
        let resolved = location.or(&self.default_location);
        if let Some(drive_id) = resolved.drive_id {
            return Some(format!("{}/drives/{}", self.graph_root, urlencoding::encode(&drive_id)));
        }
        if let Some(site_id) = resolved.site_id {
            return Some(format!("{}/sites/{}/drive", self.graph_root, urlencoding::encode(&site_id)));
        }
        resolved
            .user_id
            .map(|user_id| format!("{}/users/{}/drive", self.graph_root, urlencoding::encode(&user_id)))
    }

    async fn fetch_sites(&self) -> Result<Vec<Value>> {
        let url = format!(
            "{}/sites?search=*&$top=20&$select=id,displayName,webUrl",
            self.graph_root
        );
        let json = self.get_json(&url).await?;
        Ok(values(&json)
            .iter()
            .map(|site| {
                json!({
                    "id": site["id"],
                    "name": site["displayName"].as_str().unwrap_or(""),
                    "webUrl": site["webUrl"].as_str().unwrap_or(""),
                    "type": "SharePoint Site",
                })
            })
            .collect())
    }

    async fn fetch_drives(&self) -> Result<Vec<Value>> {
        let url = format!(
            "{}/drives?$top=50&$select=id,name,driveType,webUrl",
            self.graph_root
        );
        let json = self.get_json(&url).await?;
        Ok(values(&json)
            .iter()
            .map(|drive| {
                json!({
                    "id": drive["id"],
                    "name": drive["name"].as_str().unwrap_or(""),
                    "webUrl": drive["webUrl"].as_str().unwrap_or(""),
                    "driveType": drive["driveType"].as_str().unwrap_or(""),
                })
            })
            .collect())
    }

    async fn list_accessible_locations(&self) -> Result<String> {
        let (sites, drives) = tokio::join!(self.fetch_sites(), self.fetch_drives());

        let (sites, drives) = match (sites, drives) {
            (Err(err), Err(_)) => {
                return Err(ToolError::Unavailable(format!(
                    "Unable to list accessible OneDrive/SharePoint locations. {err}"
                )));
            }
            (sites, drives) => (
                sites.unwrap_or_else(|err| {
                    warn!(error = %err, "Listing SharePoint sites failed");
                    Vec::new()
                }),
                drives.unwrap_or_else(|err| {
                    warn!(error = %err, "Listing drives failed");
                    Vec::new()
                }),
            ),
        };

        Ok(json!({ "sites": sites, "drives": drives, "hint": LOCATIONS_HINT }).to_string())
    }

    async fn cross_drive_search(&self, query: &str) -> Result<String> {
        let body = json!({
            "requests": [{
                "entityTypes": ["driveItem"],
                "query": { "queryString": query },
                "from": 0,
                "size": 50
            }]
        });
        let response = self
            .send_authorized(
                self.client
                    .post(format!("{}/search/query", self.graph_root))
                    .json(&body)
                    .timeout(METADATA_TIMEOUT),
            )
            .await?;
        let json = json_or_api_error(response).await?;

        let files: Vec<Value> = json
            .pointer("/value/0/hitsContainers/0/hits")
            .and_then(Value::as_array)
            .map(|hits| hits.iter().map(|hit| format_file_item(&hit["resource"])).collect())
            .unwrap_or_default();
        Ok(json!({ "files": files }).to_string())
    }
}

fn values(json: &Value) -> &[Value] {
    json["value"].as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// Normalise a Graph `driveItem` into the shape handed to the model.
pub fn format_file_item(item: &Value) -> Value {
    let mime_type = if item["file"].is_object() {
        item["file"]["mimeType"].as_str().unwrap_or("file")
    } else {
        "folder"
    };
    json!({
        "id": item["id"].as_str().unwrap_or(""),
        "name": item["name"].as_str().unwrap_or(""),
        "mimeType": mime_type,
        "size": item["size"].as_u64().unwrap_or(0),
        "modifiedTime": item["lastModifiedDateTime"].as_str().unwrap_or(""),
        "webUrl": item["webUrl"].as_str().unwrap_or(""),
        "isFolder": item["folder"].is_object(),
        "driveId": item["parentReference"]["driveId"].as_str().unwrap_or(""),
    })
}

fn format_file_list(json: &Value) -> String {
    let files: Vec<Value> = values(json).iter().map(format_file_item).collect();
    json!({ "files": files }).to_string()
}

#[async_trait]
impl StorageBackend for OneDriveBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::OneDrive
    }

    fn is_configured(&self) -> bool {
        self.credentials.complete().is_some()
    }

    async fn list_files(&self, folder_id: Option<&str>, location: &DriveLocation) -> Result<String> {
        let base = self.drive_base(location);
        debug!(folder = ?folder_id, base = ?base, "Listing OneDrive files");

        let base = match (base, folder_id) {
            (None, None) => return self.list_accessible_locations().await,
            (None, Some(_)) => {
                return Err(ToolError::InvalidRequest(format!(
                    "Cannot browse an item by ID without drive context. {DRIVE_CONTEXT_HINT}"
                )));
            }
            (Some(base), _) => base,
        };

        let parent = match folder_id {
            Some(folder) => format!("items/{}", urlencoding::encode(folder)),
            None => "root".to_string(),
        };
        let url = format!(
            "{base}/{parent}/children?$top=100&$orderby=lastModifiedDateTime+desc&$select={ITEM_SELECT}"
        );
        let json = self.get_json(&url).await?;
        Ok(format_file_list(&json))
    }

    async fn search_files(&self, query: &str, location: &DriveLocation) -> Result<String> {
        let Some(base) = self.drive_base(location) else {
            debug!(query, "Searching across OneDrive/SharePoint");
            return self.cross_drive_search(query).await;
        };

        let literal = urlencoding::encode(&query.replace('\'', "''")).into_owned();
        let url = format!("{base}/root/search(q='{literal}')?$top=100&$select={ITEM_SELECT}");
        let json = self.get_json(&url).await?;
        Ok(format_file_list(&json))
    }

    async fn read_file(&self, file_id: &str, options: &ReadOptions) -> Result<String> {
        let Some(base) = self.drive_base(&options.location) else {
            return Err(ToolError::InvalidRequest(format!(
                "Cannot read file without drive context. {DRIVE_CONTEXT_HINT}"
            )));
        };
        let item_path = format!("{base}/items/{}", urlencoding::encode(file_id));

        let metadata = self
            .get_json(&format!(
                "{item_path}?$select=id,name,file,size,lastModifiedDateTime,webUrl,parentReference"
            ))
            .await?;
        if !metadata["file"].is_object() {
            return Err(ToolError::InvalidRequest(
                "The selected item is a folder. Choose a file item instead.".to_string(),
            ));
        }

        let name = metadata["name"].as_str().unwrap_or("").to_string();
        let mime_type = metadata["file"]["mimeType"].as_str().unwrap_or("").to_string();
        let web_url = metadata["webUrl"].as_str().unwrap_or("").to_string();
        let drive_id = metadata["parentReference"]["driveId"]
            .as_str()
            .map(str::to_string)
            .or_else(|| options.location.drive_id.clone())
            .unwrap_or_default();

        let response = self
            .send_authorized(
                self.client
                    .get(format!("{item_path}/content"))
                    .timeout(CONTENT_TIMEOUT),
            )
            .await?;
        let bytes = ensure_success(response).await?.bytes().await?;

        let (extract_mime, extract_name) = (mime_type.clone(), name.clone());
        let text = tokio::task::spawn_blocking(move || extract_text(&bytes, &extract_mime, &extract_name))
            .await
            .map_err(|e| ToolError::Extraction(e.to_string()))?
            .ok_or_else(|| {
                let shown = if mime_type.is_empty() { "unknown" } else { mime_type.as_str() };
                ToolError::Extraction(format!(
                    "Could not extract readable text from this file type ({shown})."
                ))
            })?;

        let payload = json!({
            "file": {
                "id": file_id,
                "driveId": drive_id,
                "name": name,
                "mimeType": mime_type,
                "webUrl": web_url,
            },
            "content": cap_read_content(&text),
        });
        Ok(payload.to_string())
    }
}
