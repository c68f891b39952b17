// ABOUTME: Wire-format request/response/error types for the OAuth HTTP Surface
// ABOUTME: OAuth2Error mirrors RFC 6749's {error, error_description, error_uri} schema
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use serde::{Deserialize, Serialize};

/// RFC 7591 dynamic client registration request.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRegistrationRequest {
    pub client_name: Option<String>,
    pub redirect_uris: Vec<String>,
    pub grant_types: Option<Vec<String>>,
    pub scope: Option<String>,
}

/// RFC 7591 dynamic client registration response: full client metadata plus the
/// generated `client_id`.
#[derive(Debug, Clone, Serialize)]
pub struct ClientRegistrationResponse {
    pub client_id: String,
    pub client_name: Option<String>,
    pub redirect_uris: Vec<String>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub scope: String,
}

/// Query parameters accepted at `GET /authorize`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeRequest {
    pub response_type: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub resource: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

/// Form body accepted at `POST /token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    pub refresh_token: Option<String>,
    pub code_verifier: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub refresh_token: String,
    pub scope: String,
}

/// Form body accepted at `POST /revoke` (RFC 7009).
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeRequest {
    pub token: String,
    pub client_id: Option<String>,
    pub token_type_hint: Option<String>,
}

/// Form body accepted at `POST /oauth/login` (local adapter identifier submission).
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub temp_key: String,
    pub identifier: String,
}

/// Form body accepted at `POST /oauth/authorize/approve` and `/oauth/consent/approve`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsentDecision {
    pub temp_key: String,
    pub approved: bool,
}

/// Query parameters accepted at `GET /oauth/login` and `GET /oauth/consent/page`.
#[derive(Debug, Clone, Deserialize)]
pub struct TempKeyQuery {
    pub temp_key: String,
}

/// Query parameters on a federated provider's callback (`/oauth/{google,azure}/callback`).
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderCallbackQuery {
    pub code: Option<String>,
    pub state: String,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// RFC 6749-shaped OAuth protocol error, used for every OAuth-wire error response
/// (back-channel JSON body or front-channel redirect query parameters).
#[derive(Debug, Clone, Serialize)]
pub struct OAuth2Error {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuth2Error {
    fn new(error: &'static str, description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: Some(description.into()),
        }
    }

    #[must_use]
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new("invalid_request", description)
    }

    #[must_use]
    pub fn invalid_client(description: impl Into<String>) -> Self {
        Self::new("invalid_client", description)
    }

    #[must_use]
    pub fn invalid_grant(description: impl Into<String>) -> Self {
        Self::new("invalid_grant", description)
    }

    #[must_use]
    pub fn invalid_scope(description: impl Into<String>) -> Self {
        Self::new("invalid_scope", description)
    }

    #[must_use]
    pub fn unauthorized_client(description: impl Into<String>) -> Self {
        Self::new("unauthorized_client", description)
    }

    #[must_use]
    pub fn unsupported_grant_type(description: impl Into<String>) -> Self {
        Self::new("unsupported_grant_type", description)
    }

    #[must_use]
    pub fn access_denied(description: impl Into<String>) -> Self {
        Self::new("access_denied", description)
    }

    #[must_use]
    pub fn server_error(description: impl Into<String>) -> Self {
        Self::new("server_error", description)
    }

    /// Render as `error=...&error_description=...` query-string fragment for a
    /// front-channel redirect.
    #[must_use]
    pub fn to_query_params(&self) -> String {
        let mut out = format!("error={}", urlencoding::encode(self.error));
        if let Some(desc) = &self.error_description {
            out.push_str(&format!("&error_description={}", urlencoding::encode(desc)));
        }
        out
    }
}
