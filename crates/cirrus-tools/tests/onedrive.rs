//! OneDrive backend against a mocked Microsoft Graph and login endpoint

use cirrus_ai::tools::{DriveLocation, ReadOptions, StorageBackend};
use cirrus_tools::onedrive::{OneDriveBackend, OneDriveCredentials};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn disable_system_proxy_for_tests() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        // Safety: set once for the process before any HTTP clients are built.
        unsafe {
            std::env::set_var("CIRRUS_DISABLE_SYSTEM_PROXY", "1");
        }
    });
}

async fn backend_for(server: &MockServer) -> OneDriveBackend {
    disable_system_proxy_for_tests();
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "graph-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(server)
        .await;

    OneDriveBackend::new(OneDriveCredentials {
        tenant_id: Some("tenant-1".to_string()),
        client_id: Some("client-1".to_string()),
        client_secret: Some("secret-1".to_string()),
    })
    .with_endpoints(server.uri(), server.uri())
}

fn drive(id: &str) -> DriveLocation {
    DriveLocation {
        drive_id: Some(id.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_list_drive_root_normalises_items() {
    let server = MockServer::start().await;
    let backend = backend_for(&server).await;

    Mock::given(method("GET"))
        .and(path("/drives/d1/root/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"id": "f1", "name": "Notes.txt", "file": {"mimeType": "text/plain"}, "size": 12,
                 "lastModifiedDateTime": "2024-01-02T03:04:05Z", "webUrl": "https://x/Notes.txt",
                 "parentReference": {"driveId": "d1"}},
                {"id": "f2", "name": "Archive", "folder": {"childCount": 0}}
            ]
        })))
        .mount(&server)
        .await;

    let listed = backend.list_files(None, &drive("d1")).await.unwrap();
    let listed: Value = serde_json::from_str(&listed).unwrap();

    assert_eq!(listed["files"][0]["mimeType"], "text/plain");
    assert_eq!(listed["files"][0]["driveId"], "d1");
    assert_eq!(listed["files"][1]["isFolder"], true);
    assert_eq!(listed["files"][1]["mimeType"], "folder");

    // Second call reuses the cached token; the token mock expects exactly one hit.
    backend.list_files(None, &drive("d1")).await.unwrap();
}

#[tokio::test]
async fn test_no_context_lists_locations_with_partial_failure() {
    let server = MockServer::start().await;
    let backend = backend_for(&server).await;

    Mock::given(method("GET"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": "accessDenied", "message": "Sites.Read.All required"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drives"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "d1", "name": "Documents", "driveType": "documentLibrary", "webUrl": "https://x/d1"}]
        })))
        .mount(&server)
        .await;

    let listed = backend
        .list_files(None, &DriveLocation::default())
        .await
        .unwrap();
    let listed: Value = serde_json::from_str(&listed).unwrap();

    assert_eq!(listed["sites"], json!([]));
    assert_eq!(listed["drives"][0]["driveType"], "documentLibrary");
    assert!(listed["hint"].as_str().unwrap().contains("list_onedrive_files"));
}

#[tokio::test]
async fn test_no_context_total_failure_is_an_error() {
    let server = MockServer::start().await;
    let backend = backend_for(&server).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"message": "Access denied"}
        })))
        .mount(&server)
        .await;

    let err = backend
        .list_files(None, &DriveLocation::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unable to list accessible OneDrive/SharePoint locations. HTTP 403: Access denied"
    );
}

#[tokio::test]
async fn test_search_without_context_uses_cross_drive_search() {
    let server = MockServer::start().await;
    let backend = backend_for(&server).await;

    Mock::given(method("POST"))
        .and(path("/search/query"))
        .and(body_partial_json(json!({
            "requests": [{"entityTypes": ["driveItem"], "query": {"queryString": "roadmap"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"hitsContainers": [{"hits": [
                {"resource": {"id": "r1", "name": "Roadmap.pdf", "file": {"mimeType": "application/pdf"},
                              "parentReference": {"driveId": "d9"}}}
            ]}]}]
        })))
        .mount(&server)
        .await;

    let found = backend
        .search_files("roadmap", &DriveLocation::default())
        .await
        .unwrap();
    let found: Value = serde_json::from_str(&found).unwrap();
    assert_eq!(found["files"][0]["name"], "Roadmap.pdf");
    assert_eq!(found["files"][0]["driveId"], "d9");
}

#[tokio::test]
async fn test_read_file_extracts_text() {
    let server = MockServer::start().await;
    let backend = backend_for(&server).await;

    Mock::given(method("GET"))
        .and(path("/sites/s1/drive/items/i1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "i1",
            "name": "minutes.md",
            "file": {"mimeType": "text/markdown"},
            "webUrl": "https://contoso.sharepoint.com/minutes.md",
            "parentReference": {"driveId": "d-site"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sites/s1/drive/items/i1/content"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Minutes\nShip it."))
        .mount(&server)
        .await;

    let options = ReadOptions {
        location: DriveLocation {
            site_id: Some("s1".to_string()),
            ..Default::default()
        },
        prefer_export: false,
    };
    let result = backend.read_file("i1", &options).await.unwrap();
    let result: Value = serde_json::from_str(&result).unwrap();

    assert_eq!(result["content"], "# Minutes\nShip it.");
    assert_eq!(result["file"]["driveId"], "d-site");
    assert_eq!(result["file"]["webUrl"], "https://contoso.sharepoint.com/minutes.md");
}

#[tokio::test]
async fn test_read_folder_is_rejected() {
    let server = MockServer::start().await;
    let backend = backend_for(&server).await;

    Mock::given(method("GET"))
        .and(path("/drives/d1/items/folder-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "folder-1",
            "name": "Reports"
        })))
        .mount(&server)
        .await;

    let options = ReadOptions {
        location: drive("d1"),
        prefer_export: false,
    };
    let err = backend.read_file("folder-1", &options).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "The selected item is a folder. Choose a file item instead."
    );
}

#[tokio::test]
async fn test_token_failure_message() {
    disable_system_proxy_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .mount(&server)
        .await;

    let backend = OneDriveBackend::new(OneDriveCredentials {
        tenant_id: Some("tenant-1".to_string()),
        client_id: Some("client-1".to_string()),
        client_secret: Some("wrong".to_string()),
    })
    .with_endpoints(server.uri(), server.uri());

    let err = backend.list_files(None, &drive("d1")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "AADSTS7000215: Invalid client secret provided."
    );
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_on_next_call() {
    disable_system_proxy_for_tests();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "graph-token",
            "expires_in": 3599
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drives/d1/root/children"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": "InvalidAuthenticationToken", "message": "Access token has expired."}
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drives/d1/root/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .mount(&server)
        .await;

    let backend = OneDriveBackend::new(OneDriveCredentials {
        tenant_id: Some("tenant-1".to_string()),
        client_id: Some("client-1".to_string()),
        client_secret: Some("secret-1".to_string()),
    })
    .with_endpoints(server.uri(), server.uri());

    let err = backend.list_files(None, &drive("d1")).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 401: Access token has expired.");

    let listed = backend.list_files(None, &drive("d1")).await.unwrap();
    assert_eq!(listed, json!({ "files": [] }).to_string());
}
