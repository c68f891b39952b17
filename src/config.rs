// ABOUTME: Environment-driven configuration for the OAuth authorization server
// ABOUTME: Loads SERVER_URL, OAUTH_* and HTTP_PORT into a typed, validated ServerConfig
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{defaults, env_vars};

/// Which identity source backs the authorization flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Built-in demo identity source; treats any submitted identifier as authenticated.
    Custom,
    Google,
    Azure,
}

impl ProviderKind {
    fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "google" => Self::Google,
            "azure" => Self::Azure,
            _ => Self::Custom,
        }
    }

    #[must_use]
    pub const fn is_federated(self) -> bool {
        !matches!(self, Self::Custom)
    }
}

/// Federation-related settings, populated regardless of which provider is active so the
/// adapter registry can be built once at startup.
#[derive(Debug, Clone)]
pub struct OAuth2ServerConfig {
    pub provider: ProviderKind,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tenant_id: String,
    pub valid_scopes: Vec<String>,
    pub default_scopes: Vec<String>,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub auth_code_ttl_secs: i64,
}

/// Top-level server configuration, loaded once at startup and shared read-only
/// behind an `Arc` for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub issuer_url: String,
    pub oauth_enabled: bool,
    pub http_port: u16,
    pub data_dir: PathBuf,
    pub oauth2: OAuth2ServerConfig,
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric environment variable fails to parse, or if a
    /// federated provider is selected without its required client credentials.
    pub fn from_env() -> Result<Self> {
        let issuer_url = env_or(env_vars::SERVER_URL, "http://localhost:8080");
        let oauth_enabled = env::var(env_vars::OAUTH_ENABLED)
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        let http_port = env::var(env_vars::HTTP_PORT)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::HTTP_PORT);
        let data_dir = PathBuf::from(env_or(env_vars::OAUTH_DATA_DIR, defaults::OAUTH_DATA_DIR));

        let provider = ProviderKind::from_str_or_default(&env_or(
            env_vars::OAUTH_PROVIDER,
            "custom",
        ));
        let client_id = env::var(env_vars::OAUTH_CLIENT_ID).ok();
        let client_secret = env::var(env_vars::OAUTH_CLIENT_SECRET).ok();
        let tenant_id = env_or(env_vars::OAUTH_TENANT_ID, defaults::AZURE_TENANT);

        let valid_scopes = env::var(env_vars::OAUTH_VALID_SCOPES)
            .map(|v| comma_list(&v))
            .unwrap_or_else(|_| defaults::VALID_SCOPES.iter().map(|s| (*s).to_owned()).collect());
        let default_scopes = env::var(env_vars::OAUTH_DEFAULT_SCOPES)
            .map(|v| comma_list(&v))
            .unwrap_or_else(|_| {
                defaults::DEFAULT_SCOPES
                    .iter()
                    .map(|s| (*s).to_owned())
                    .collect()
            });

        let access_token_ttl_secs = parse_ttl(
            env_vars::OAUTH_ACCESS_TOKEN_TTL,
            defaults::ACCESS_TOKEN_TTL_SECS,
        )?;
        let refresh_token_ttl_secs = parse_ttl(
            env_vars::OAUTH_REFRESH_TOKEN_TTL,
            defaults::REFRESH_TOKEN_TTL_SECS,
        )?;
        let auth_code_ttl_secs =
            parse_ttl(env_vars::OAUTH_AUTH_CODE_TTL, defaults::AUTH_CODE_TTL_SECS)?;

        let config = Self {
            issuer_url,
            oauth_enabled,
            http_port,
            data_dir,
            oauth2: OAuth2ServerConfig {
                provider,
                client_id,
                client_secret,
                tenant_id,
                valid_scopes,
                default_scopes,
                access_token_ttl_secs,
                refresh_token_ttl_secs,
                auth_code_ttl_secs,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check for internally-inconsistent configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a federated provider is selected without client credentials.
    pub fn validate(&self) -> Result<()> {
        if self.oauth2.provider.is_federated()
            && (self.oauth2.client_id.is_none() || self.oauth2.client_secret.is_none())
        {
            bail!(
                "OAUTH_PROVIDER={:?} requires OAUTH_CLIENT_ID and OAUTH_CLIENT_SECRET",
                self.oauth2.provider
            );
        }
        Ok(())
    }
}

fn parse_ttl(key: &str, default: i64) -> Result<i64> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<i64>()
            .with_context(|| format!("{key} must be an integer number of seconds")),
        Err(_) => Ok(default),
    }
}
