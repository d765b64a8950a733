//! End-to-end tests for registration, tokens and password changes.
//!
//! Run with: cargo test -p shopvely-integration-tests -- --ignored

use reqwest::{Client, Method, StatusCode};
use serde_json::json;

use shopvely_integration_tests::{Session, api_base_url, decode};

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_profile_and_duplicate_username() {
    let session = Session::customer().await;

    let (status, me) = session.call(Method::GET, "/users/me/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], session.username.as_str());
    assert_eq!(me["is_staff"], false);

    let resp = Client::new()
        .post(format!("{}/api/users/register/", api_base_url()))
        .json(&json!({ "username": session.username, "password": "another password" }))
        .send()
        .await
        .unwrap();
    let (status, body) = decode(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "A user with that username already exists.");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_wrong_credentials_and_bad_tokens() {
    let session = Session::customer().await;
    let client = Client::new();
    let base = api_base_url();

    let resp = client
        .post(format!("{base}/api/token/"))
        .header("x-forwarded-for", "10.255.0.1")
        .json(&json!({ "username": session.username, "password": "not it" }))
        .send()
        .await
        .unwrap();
    let (status, body) = decode(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["detail"],
        "No active account found with the given credentials"
    );

    let resp = client
        .get(format!("{base}/api/users/me/"))
        .bearer_auth("definitely-not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_refresh_issues_working_access_token() {
    let mut session = Session::customer().await;

    let resp = session
        .client
        .post(format!("{}/api/token/refresh/", session.base_url))
        .header("x-forwarded-for", "10.255.0.2")
        .json(&json!({ "refresh": session.refresh }))
        .send()
        .await
        .unwrap();
    let (status, body) = decode(resp).await;
    assert_eq!(status, StatusCode::OK);

    session.access = body["access"].as_str().unwrap().to_string();
    let (status, _) = session.call(Method::GET, "/users/me/", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_change_password_revokes_refresh_tokens() {
    let session = Session::customer().await;

    let (status, body) = session
        .call(
            Method::POST,
            "/users/change-password/",
            Some(json!({ "old_password": "wrong", "new_password": "whatever123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Old password is not correct.");

    let (status, body) = session
        .call(
            Method::POST,
            "/users/change-password/",
            Some(json!({
                "old_password": session.password,
                "new_password": "a brand new passphrase",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Password updated successfully.");

    let resp = session
        .client
        .post(format!("{}/api/token/refresh/", session.base_url))
        .header("x-forwarded-for", "10.255.0.3")
        .json(&json!({ "refresh": session.refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Access tokens live until they expire
    let (status, _) = session.call(Method::GET, "/users/me/", None).await;
    assert_eq!(status, StatusCode::OK);
}
