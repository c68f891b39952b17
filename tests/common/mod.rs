// ABOUTME: Shared test harness: builds an in-process Router over an isolated store
// ABOUTME: directory, plus small helpers for driving requests through `oneshot`

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use mcp_oauth_gateway::config::{OAuth2ServerConfig, ProviderKind, ServerConfig};
use mcp_oauth_gateway::store::Store;
use mcp_oauth_gateway::{http, AppContext};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use tower::ServiceExt;

pub struct TestServer {
    pub router: Router,
    // Keeps the per-test store directory alive for the lifetime of the server.
    _dir: tempfile::TempDir,
}

pub async fn spawn() -> TestServer {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Arc::new(ServerConfig {
        issuer_url: "https://auth.example.test".to_owned(),
        oauth_enabled: true,
        http_port: 0,
        data_dir: dir.path().to_path_buf(),
        oauth2: OAuth2ServerConfig {
            provider: ProviderKind::Custom,
            client_id: None,
            client_secret: None,
            tenant_id: "common".to_owned(),
            valid_scopes: vec!["read".to_owned(), "write".to_owned(), "profile".to_owned()],
            default_scopes: vec!["read".to_owned()],
            access_token_ttl_secs: 3_600,
            refresh_token_ttl_secs: 86_400,
            auth_code_ttl_secs: 600,
        },
    });
    let store = Arc::new(
        Store::load(&config.data_dir, &config.oauth2.default_scopes[0])
            .await
            .expect("store load"),
    );
    let ctx = Arc::new(AppContext::new(config, store));
    TestServer {
        router: http::build_router(ctx),
        _dir: dir,
    }
}

/// A PKCE S256 verifier/challenge pair, long enough to satisfy RFC 7636 §4.1.
pub fn pkce_pair() -> (String, String) {
    let verifier = "test-code-verifier-with-enough-entropy-0123456789".to_owned();
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());
    (verifier, challenge)
}

pub async fn json_post(router: &Router, path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, value)
}

pub async fn form_post(router: &Router, path: &str, form: &[(&str, &str)]) -> Response {
    let body = serde_urlencoded::to_string(form).unwrap();
    let req = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    router.clone().oneshot(req).await.unwrap()
}

pub async fn get(router: &Router, path: &str) -> Response {
    let req = Request::builder().method("GET").uri(path).body(Body::empty()).unwrap();
    router.clone().oneshot(req).await.unwrap()
}

pub type Response = axum::response::Response;

pub fn location_of(resp: &Response) -> String {
    resp.headers()
        .get("location")
        .expect("expected a Location header")
        .to_str()
        .unwrap()
        .to_owned()
}

pub fn query_param<'a>(url: &'a str, key: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    for pair in query.split('&') {
        let (k, v) = pair.split_once('=')?;
        if k == key {
            return Some(urlencoding::decode(v).unwrap().into_owned());
        }
    }
    None
}

pub async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
