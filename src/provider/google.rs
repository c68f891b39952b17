// ABOUTME: Federated adapter for Google, per SPEC_FULL.md §4.4
// ABOUTME: Authorization-code flow against accounts.google.com, userinfo via googleapis.com
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::ProviderAdapter;
use crate::constants::defaults;
use crate::errors::AppError;
use crate::store::models::UserInfo;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

pub struct GoogleAdapter {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

impl GoogleAdapter {
    #[must_use]
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::UPSTREAM_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client_id,
            client_secret,
            redirect_uri,
            http,
        }
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn name(&self) -> &'static str {
        "google"
    }

    fn initiate_authn(&self, temp_key: &str) -> String {
        // temp_key doubles as the `state` sent upstream (SPEC_FULL.md §4.4); the
        // downstream client's own `state` is never forwarded here.
        format!(
            "{GOOGLE_AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={temp_key}&access_type=offline&prompt=consent",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode("openid email profile"),
        )
    }

    async fn handle_callback(&self, code: &str) -> Result<UserInfo, AppError> {
        let token_resp: TokenResponse = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("google token exchange failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::upstream(format!("google token exchange rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("google token response malformed: {e}")))?;

        let user: GoogleUserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token_resp.access_token)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("google userinfo fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::upstream(format!("google userinfo rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("google userinfo malformed: {e}")))?;

        Ok(UserInfo {
            subject: user.sub,
            email: user.email,
            name: user.name,
        })
    }
}
