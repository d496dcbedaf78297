//! HTTP helpers shared by the backends.

use std::time::Duration;

use cirrus_ai::tools::{Result, ToolError};
use reqwest::Response;
use serde_json::Value;

/// Token endpoint requests.
pub const TOKEN_TIMEOUT: Duration = Duration::from_secs(15);

/// Metadata, listing and search requests.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(20);

/// File content downloads and exports.
pub const CONTENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pass a successful response through; turn anything else into `HTTP <status>: <body>`.
pub async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ToolError::Api {
        status: status.as_u16(),
        message: body,
    })
}

/// Parse a JSON body, preferring the API's `error.message` on failure.
pub async fn json_or_api_error(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;
    let json = serde_json::from_str::<Value>(&body).ok();

    if !status.is_success() {
        let message = json
            .as_ref()
            .and_then(|j| j.pointer("/error/message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(body);
        return Err(ToolError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(json.unwrap_or_else(|| Value::Object(Default::default())))
}
