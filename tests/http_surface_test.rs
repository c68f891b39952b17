// ABOUTME: Tests for the ambient HTTP surface and the protocol-error paths of
// ABOUTME: `/register`, `/authorize`, and `/token` that the happy-path flow never exercises

mod common;

use axum::http::StatusCode;
use common::{form_post, get, json_post, location_of, query_param, spawn};

const REDIRECT_URI: &str = "https://client.example.test/callback";

#[tokio::test]
async fn healthz_reports_ok() {
    let server = spawn().await;
    let resp = get(&server.router, "/healthz").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn discovery_document_advertises_the_expected_endpoints() {
    let server = spawn().await;
    let resp = get(&server.router, "/.well-known/oauth-authorization-server").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = common::body_json(resp).await;
    assert_eq!(body["issuer"], "https://auth.example.test");
    assert_eq!(body["authorization_endpoint"], "https://auth.example.test/authorize");
    assert_eq!(body["token_endpoint"], "https://auth.example.test/token");
    assert_eq!(body["registration_endpoint"], "https://auth.example.test/register");
    assert_eq!(body["revocation_endpoint"], "https://auth.example.test/revoke");
    let methods = body["code_challenge_methods_supported"].as_array().unwrap();
    assert!(methods.iter().any(|m| m == "S256"));
    assert!(methods.iter().any(|m| m == "plain"));
}

#[tokio::test]
async fn registration_rejects_empty_redirect_uris() {
    let server = spawn().await;
    let (status, body) = json_post(
        &server.router,
        "/register",
        serde_json::json!({ "client_name": "broken", "redirect_uris": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn registration_rejects_non_http_redirect_uris() {
    let server = spawn().await;
    let (status, body) = json_post(
        &server.router,
        "/register",
        serde_json::json!({ "client_name": "broken", "redirect_uris": ["javascript:alert(1)"] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn registration_rejects_unknown_scope() {
    let server = spawn().await;
    let (status, body) = json_post(
        &server.router,
        "/register",
        serde_json::json!({
            "client_name": "broken",
            "redirect_uris": [REDIRECT_URI],
            "scope": "read nonsense",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_scope");
}

#[tokio::test]
async fn authorize_with_unknown_client_renders_an_error_page_not_a_redirect() {
    let server = spawn().await;
    let resp = get(
        &server.router,
        &format!(
            "/authorize?response_type=code&client_id=does-not-exist&redirect_uri={}&code_challenge=abc&code_challenge_method=S256",
            urlencoding::encode(REDIRECT_URI)
        ),
    )
    .await;
    // Pre-redirect_uri-validation failures must never bounce back to an attacker-supplied URI.
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers().get("location").is_none());
}

#[tokio::test]
async fn authorize_with_unregistered_redirect_uri_renders_an_error_page() {
    let server = spawn().await;
    let (_status, body) = json_post(
        &server.router,
        "/register",
        serde_json::json!({ "client_name": "c", "redirect_uris": [REDIRECT_URI] }),
    )
    .await;
    let client_id = body["client_id"].as_str().unwrap();

    let resp = get(
        &server.router,
        &format!(
            "/authorize?response_type=code&client_id={client_id}&redirect_uri={}&code_challenge=abc&code_challenge_method=S256",
            urlencoding::encode("https://evil.example.test/callback")
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers().get("location").is_none());
}

#[tokio::test]
async fn authorize_missing_code_challenge_redirects_with_invalid_request() {
    let server = spawn().await;
    let (_status, body) = json_post(
        &server.router,
        "/register",
        serde_json::json!({ "client_name": "c", "redirect_uris": [REDIRECT_URI] }),
    )
    .await;
    let client_id = body["client_id"].as_str().unwrap();

    // redirect_uri IS registered, so this failure must bounce back as a redirect, not a page.
    let resp = get(
        &server.router,
        &format!(
            "/authorize?response_type=code&client_id={client_id}&redirect_uri={}",
            urlencoding::encode(REDIRECT_URI)
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let redirect = location_of(&resp);
    assert!(redirect.starts_with(REDIRECT_URI));
    assert_eq!(query_param(&redirect, "error").as_deref(), Some("invalid_request"));
}

#[tokio::test]
async fn token_endpoint_rejects_unsupported_grant_type() {
    let server = spawn().await;
    let (_status, body) = json_post(
        &server.router,
        "/register",
        serde_json::json!({ "client_name": "c", "redirect_uris": [REDIRECT_URI] }),
    )
    .await;
    let client_id = body["client_id"].as_str().unwrap().to_owned();

    let resp = form_post(
        &server.router,
        "/token",
        &[("grant_type", "client_credentials"), ("client_id", &client_id)],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"], "unauthorized_client");
}

#[tokio::test]
async fn token_endpoint_rejects_unknown_client() {
    let server = spawn().await;
    let resp = form_post(
        &server.router,
        "/token",
        &[
            ("grant_type", "authorization_code"),
            ("client_id", "does-not-exist"),
            ("code", "whatever"),
            ("redirect_uri", REDIRECT_URI),
            ("code_verifier", &"x".repeat(43)),
        ],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"], "invalid_client");
}

#[tokio::test]
async fn revoke_is_always_200_even_for_unknown_tokens() {
    let server = spawn().await;
    let resp = form_post(&server.router, "/revoke", &[("token", "never-issued")]).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unconfigured_provider_callback_path_returns_not_found() {
    let server = spawn().await;
    // This test server runs the local ("custom") adapter; /oauth/google/callback must 404.
    let resp = get(&server.router, "/oauth/google/callback?state=abc&code=xyz").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

