// ABOUTME: Federated adapter for Azure Entra ID, per SPEC_FULL.md §4.4
// ABOUTME: Tenant-scoped authority, userinfo via Microsoft Graph /me, User.Read scope
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::ProviderAdapter;
use crate::constants::defaults;
use crate::errors::AppError;
use crate::store::models::UserInfo;

const GRAPH_ME_URL: &str = "https://graph.microsoft.com/v1.0/me";

pub struct AzureAdapter {
    client_id: String,
    client_secret: String,
    tenant_id: String,
    redirect_uri: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GraphUser {
    id: String,
    mail: Option<String>,
    #[serde(rename = "userPrincipalName")]
    user_principal_name: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

impl AzureAdapter {
    #[must_use]
    pub fn new(client_id: String, client_secret: String, tenant_id: String, redirect_uri: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::UPSTREAM_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client_id,
            client_secret,
            tenant_id,
            redirect_uri,
            http,
        }
    }

    fn authority(&self) -> String {
        format!("https://login.microsoftonline.com/{}", self.tenant_id)
    }
}

#[async_trait]
impl ProviderAdapter for AzureAdapter {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn initiate_authn(&self, temp_key: &str) -> String {
        format!(
            "{}/oauth2/v2.0/authorize?client_id={}&redirect_uri={}&response_type=code&scope={}&state={temp_key}",
            self.authority(),
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode("openid profile User.Read"),
        )
    }

    async fn handle_callback(&self, code: &str) -> Result<UserInfo, AppError> {
        let token_url = format!("{}/oauth2/v2.0/token", self.authority());
        let token_resp: TokenResponse = self
            .http
            .post(&token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
                ("scope", "openid profile User.Read"),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("azure token exchange failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::upstream(format!("azure token exchange rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("azure token response malformed: {e}")))?;

        let user: GraphUser = self
            .http
            .get(GRAPH_ME_URL)
            .bearer_auth(&token_resp.access_token)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("graph /me fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::upstream(format!("graph /me rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("graph /me response malformed: {e}")))?;

        Ok(UserInfo {
            subject: user.id,
            email: user.mail.or(user.user_principal_name),
            name: user.display_name,
        })
    }
}
