//! Share creation, resolution by alias and the view/password gate.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

async fn protected_share(app: &TestApp, token: &str, max_views: i32) -> (String, String) {
    let file_id = app.library_file(token, "report.pdf", b"%PDF-1.7 quarterly").await;
    let share = app
        .request(
            "POST",
            "/api/shares",
            Some(json!({
                "name": "Q3 report",
                "fileIds": [file_id],
                "maxViews": max_views,
                "password": "correct horse",
            })),
            Some(token),
        )
        .await;
    assert_eq!(share.status, StatusCode::CREATED, "{}", share.body);
    assert_eq!(share.body["data"]["hasPassword"], true);
    (share.str("alias"), file_id)
}

#[tokio::test]
async fn test_resolve_counts_views_until_limit() {
    let app = TestApp::new().await;
    let token = app.owner_token();
    let (alias, file_id) = protected_share(&app, &token, 2).await;
    let path = format!("/api/s/{alias}");

    let missing = app.request("POST", &path, Some(json!({})), None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.error_code(), "INVALID_PASSWORD");

    let wrong = app
        .request("POST", &path, Some(json!({ "password": "nope" })), None)
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let first = app
        .request("POST", &path, Some(json!({ "password": "correct horse" })), None)
        .await;
    assert_eq!(first.status, StatusCode::OK, "{}", first.body);
    assert_eq!(first.body["data"]["share"]["views"], 1);
    let files = first.body["data"]["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], file_id.as_str());

    let download = app
        .get_raw(files[0]["downloadUrl"].as_str().unwrap())
        .await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(&download.body[..], b"%PDF-1.7 quarterly");

    let second = app
        .request("POST", &path, Some(json!({ "password": "correct horse" })), None)
        .await;
    assert_eq!(second.status, StatusCode::OK);

    let exhausted = app
        .request("POST", &path, Some(json!({ "password": "correct horse" })), None)
        .await;
    assert_eq!(exhausted.status, StatusCode::GONE);
    assert_eq!(exhausted.error_code(), "VIEW_LIMIT_REACHED");
}

#[tokio::test]
async fn test_failed_password_does_not_spend_a_view() {
    let app = TestApp::new().await;
    let token = app.owner_token();
    let (alias, _) = protected_share(&app, &token, 1).await;
    let path = format!("/api/s/{alias}");

    for _ in 0..3 {
        let wrong = app
            .request("POST", &path, Some(json!({ "password": "guess" })), None)
            .await;
        assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    }
    let ok = app
        .request("POST", &path, Some(json!({ "password": "correct horse" })), None)
        .await;
    assert_eq!(ok.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_alias_and_foreign_share_are_not_found() {
    let app = TestApp::new().await;
    let owner = app.owner_token();
    let stranger = app.owner_token();

    let unknown = app
        .request("POST", "/api/s/no-such-alias", Some(json!({})), None)
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let share = app
        .request("POST", "/api/shares", Some(json!({})), Some(&owner))
        .await;
    assert_eq!(share.status, StatusCode::CREATED);
    let id = share.str("id");

    let foreign = app
        .request("GET", &format!("/api/shares/{id}"), None, Some(&stranger))
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);

    let anonymous = app.request("GET", "/api/shares", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_updates_and_clears_password() {
    let app = TestApp::new().await;
    let token = app.owner_token();
    let (alias, _) = protected_share(&app, &token, 10).await;

    let listed = app.request("GET", "/api/shares", None, Some(&token)).await;
    let id = listed.body["data"][0]["id"].as_str().unwrap().to_string();

    let cleared = app
        .request(
            "PUT",
            &format!("/api/shares/{id}/password"),
            Some(json!({ "password": null })),
            Some(&token),
        )
        .await;
    assert_eq!(cleared.status, StatusCode::OK, "{}", cleared.body);

    let open = app
        .request("POST", &format!("/api/s/{alias}"), Some(json!({})), None)
        .await;
    assert_eq!(open.status, StatusCode::OK);

    let renamed = app
        .request(
            "PATCH",
            &format!("/api/shares/{id}"),
            Some(json!({ "name": null, "maxViews": 1 })),
            Some(&token),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK, "{}", renamed.body);
    assert!(renamed.body["data"]["name"].is_null());

    let gone = app
        .request("POST", &format!("/api/s/{alias}"), Some(json!({})), None)
        .await;
    assert_eq!(gone.status, StatusCode::GONE);

    let deleted = app
        .request("DELETE", &format!("/api/shares/{id}"), None, Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_token_misuse_is_a_generic_bad_request() {
    let app = TestApp::new().await;
    let token = app.owner_token();
    let grant = app
        .request(
            "POST",
            "/api/files/uploads",
            Some(json!({ "fileName": "a.txt" })),
            Some(&token),
        )
        .await;
    let upload_url = grant.str("uploadUrl");
    let upload_token = upload_url.rsplit('/').next().unwrap();

    let mismatched = app
        .request(
            "GET",
            &format!("/api/filesystem/download/{upload_token}"),
            None,
            None,
        )
        .await;
    assert_eq!(mismatched.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatched.error_code(), "INVALID_TOKEN");
    assert_eq!(mismatched.body["message"], "Invalid token");

    let garbage = app
        .request("GET", "/api/filesystem/download/not-a-token", None, None)
        .await;
    assert_eq!(garbage.status, StatusCode::BAD_REQUEST);
    assert_eq!(garbage.body["message"], "Invalid token");
}

#[tokio::test]
async fn test_notify_recipients() {
    let app = TestApp::new().await;
    let token = app.owner_token();
    let created = app
        .request("POST", "/api/shares", Some(json!({ "name": "Drafts" })), Some(&token))
        .await;
    let path = format!("/api/shares/{}/notify", created.str("id"));
    let body = json!({ "shareLink": "https://files.example.com/s/drafts" });

    let empty = app
        .request("POST", &path, Some(body.clone()), Some(&token))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.error_code(), "VALIDATION");

    app.request(
        "POST",
        &format!("/api/shares/{}/recipients", created.str("id")),
        Some(json!({ "recipients": ["ann@example.com"] })),
        Some(&token),
    )
    .await;

    let bad_link = app
        .request("POST", &path, Some(json!({ "shareLink": "not a url" })), Some(&token))
        .await;
    assert_eq!(bad_link.status, StatusCode::BAD_REQUEST);

    let mut events = app.state.events.subscribe();
    let sent = app.request("POST", &path, Some(body), Some(&token)).await;
    assert_eq!(sent.status, StatusCode::OK, "{}", sent.body);
    assert_eq!(
        sent.body["data"]["notifiedRecipients"],
        json!(["ann@example.com"])
    );
    assert!(events.try_recv().is_ok());
}
