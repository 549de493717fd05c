//! Reverse share uploads, registration and copy into the owner's library.

use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::helpers::TestApp;

async fn reverse_share(app: &TestApp, token: &str, body: Value) -> (String, String) {
    let created = app
        .request("POST", "/api/reverse-shares", Some(body), Some(token))
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    (created.str("id"), created.str("alias"))
}

/// Authorize, upload and register one file; returns the registered record.
async fn upload(app: &TestApp, alias: &str, file_name: &str, bytes: &'static [u8]) -> Value {
    let grant = app
        .request(
            "POST",
            &format!("/api/r/{alias}/uploads"),
            Some(json!({ "fileName": file_name, "size": bytes.len() })),
            None,
        )
        .await;
    assert_eq!(grant.status, StatusCode::OK, "{}", grant.body);

    let stored = app.put_bytes(&grant.str("uploadUrl"), bytes).await;
    assert_eq!(stored.status, StatusCode::CREATED, "{}", stored.body);

    let registered = app
        .request(
            "POST",
            &format!("/api/r/{alias}/files"),
            Some(json!({
                "registrationToken": grant.str("registrationToken"),
                "uploaderName": "Dana",
            })),
            None,
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);
    registered.body["data"].clone()
}

#[tokio::test]
async fn test_upload_register_and_copy_to_library() {
    let app = TestApp::new().await;
    let token = app.owner_token();
    let (id, alias) = reverse_share(
        &app,
        &token,
        json!({ "name": "Tax documents", "maxFiles": 1, "allowedFileTypes": "txt,pdf" }),
    )
    .await;

    let info = app
        .request("POST", &format!("/api/r/{alias}"), Some(json!({})), None)
        .await;
    assert_eq!(info.status, StatusCode::OK);
    assert_eq!(info.body["data"]["remainingFiles"], 1);

    let file = upload(&app, &alias, "notes.txt", b"hello").await;
    assert_eq!(file["size"], 5);
    let file_id = file["id"].as_str().unwrap().to_string();

    let full = app
        .request(
            "POST",
            &format!("/api/r/{alias}/uploads"),
            Some(json!({ "fileName": "more.txt", "size": 1 })),
            None,
        )
        .await;
    assert_eq!(full.status, StatusCode::BAD_REQUEST);

    let listed = app
        .request("GET", &format!("/api/reverse-shares/{id}/files"), None, Some(&token))
        .await;
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

    let copied = app
        .request(
            "POST",
            &format!("/api/reverse-shares/files/{file_id}/copy"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(copied.status, StatusCode::CREATED, "{}", copied.body);
    assert_eq!(copied.body["data"]["name"], "notes");
    assert_eq!(copied.body["data"]["extension"], "txt");

    let library = app.request("GET", "/api/files", None, Some(&token)).await;
    let library = library.body["data"].as_array().unwrap().clone();
    assert_eq!(library.len(), 1);

    let handle = app
        .request(
            "GET",
            &format!("/api/files/{}/download", library[0]["id"].as_str().unwrap()),
            None,
            Some(&token),
        )
        .await;
    let bytes = app.get_raw(&handle.str("url")).await;
    assert_eq!(&bytes.body[..], b"hello");

    let again = app
        .request(
            "POST",
            &format!("/api/reverse-shares/files/{file_id}/copy"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_registration_token_is_single_use() {
    let app = TestApp::new().await;
    let token = app.owner_token();
    let (id, alias) = reverse_share(&app, &token, json!({})).await;

    let grant = app
        .request(
            "POST",
            &format!("/api/r/{alias}/uploads"),
            Some(json!({ "fileName": "scan.pdf", "size": 4 })),
            None,
        )
        .await;
    app.put_bytes(&grant.str("uploadUrl"), b"%PDF").await;

    let body = json!({ "registrationToken": grant.str("registrationToken") });
    let first = app
        .request("POST", &format!("/api/r/{alias}/files"), Some(body.clone()), None)
        .await;
    assert_eq!(first.status, StatusCode::CREATED, "{}", first.body);
    let replay = app
        .request("POST", &format!("/api/r/{alias}/files"), Some(body), None)
        .await;
    assert_eq!(replay.status, StatusCode::CONFLICT);

    let listed = app
        .request("GET", &format!("/api/reverse-shares/{id}/files"), None, Some(&token))
        .await;
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stranger_cannot_copy() {
    let app = TestApp::new().await;
    let owner = app.owner_token();
    let (_, alias) = reverse_share(&app, &owner, json!({})).await;
    let file = upload(&app, &alias, "scan.pdf", b"%PDF").await;

    let stranger = app.owner_token();
    let denied = app
        .request(
            "POST",
            &format!("/api/reverse-shares/files/{}/copy", file["id"].as_str().unwrap()),
            None,
            Some(&stranger),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_gate_rejects_wrong_type_and_inactive_share() {
    let app = TestApp::new().await;
    let token = app.owner_token();
    let (id, alias) = reverse_share(&app, &token, json!({ "allowedFileTypes": "pdf" })).await;

    let wrong_type = app
        .request(
            "POST",
            &format!("/api/r/{alias}/uploads"),
            Some(json!({ "fileName": "setup.exe", "size": 10 })),
            None,
        )
        .await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_type.error_code(), "VALIDATION");

    let deactivated = app
        .request(
            "POST",
            &format!("/api/reverse-shares/{id}/deactivate"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(deactivated.status, StatusCode::OK);

    let closed = app
        .request("POST", &format!("/api/r/{alias}"), Some(json!({})), None)
        .await;
    assert_eq!(closed.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_registration_token_is_bound_to_its_reverse_share() {
    let app = TestApp::new().await;
    let token = app.owner_token();
    let (_, first) = reverse_share(&app, &token, json!({})).await;
    let (_, second) = reverse_share(&app, &token, json!({})).await;

    let grant = app
        .request(
            "POST",
            &format!("/api/r/{first}/uploads"),
            Some(json!({ "fileName": "a.txt", "size": 2 })),
            None,
        )
        .await;
    app.put_bytes(&grant.str("uploadUrl"), b"hi").await;

    let misplaced = app
        .request(
            "POST",
            &format!("/api/r/{second}/files"),
            Some(json!({ "registrationToken": grant.str("registrationToken") })),
            None,
        )
        .await;
    assert_eq!(misplaced.status, StatusCode::BAD_REQUEST);
    assert_eq!(misplaced.body["message"], "Invalid token");
}

#[tokio::test]
async fn test_rename_and_delete_uploaded_file() {
    let app = TestApp::new().await;
    let token = app.owner_token();
    let (id, alias) = reverse_share(&app, &token, json!({})).await;
    let file = upload(&app, &alias, "draft.docx", b"PK..").await;
    let file_id = file["id"].as_str().unwrap();

    let renamed = app
        .request(
            "PATCH",
            &format!("/api/reverse-shares/files/{file_id}"),
            Some(json!({ "name": "final.docx" })),
            Some(&token),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK, "{}", renamed.body);
    assert_eq!(renamed.body["data"]["name"], "final");
    assert_eq!(renamed.body["data"]["extension"], "docx");

    let deleted = app
        .request(
            "DELETE",
            &format!("/api/reverse-shares/files/{file_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let listed = app
        .request("GET", &format!("/api/reverse-shares/{id}/files"), None, Some(&token))
        .await;
    assert!(listed.body["data"].as_array().unwrap().is_empty());
}
