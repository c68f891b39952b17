// ABOUTME: Authorization Orchestrator: the authorization-code state machine from
// ABOUTME: `/authorize` through consent, code issuance, token exchange, and refresh rotation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::constants::defaults;
use crate::http::models::{
    ClientRegistrationRequest, ClientRegistrationResponse, OAuth2Error, RevokeRequest,
    TokenRequest, TokenResponse,
};
use crate::provider::{self, ProviderAdapter};
use crate::scope::ScopePolicy;
use crate::store::models::{AccessToken, AuthorizationCode, Client, PendingAuthorization, RefreshToken, Timestamp};
use crate::store::Store;
use crate::token::{self, ChallengeMethod, TokenMinter};

/// An error surfaced by `/authorize` before the `redirect_uri` has been validated against
/// the client's registered set. Per SPEC_FULL.md §7, this MUST render a server-side error
/// page rather than redirect to an unvalidated URI.
#[derive(Debug, Clone)]
pub struct UnvalidatedRequestError(pub String);

/// An error surfaced by `/authorize` after the `redirect_uri` has been validated. Carries
/// the fully-formed redirect target (`redirect_uri` plus OAuth error query parameters and
/// the caller's `state`, when supplied).
#[derive(Debug, Clone)]
pub struct ValidatedRedirectError(pub String);

/// Outcome of a consent decision (approval or denial).
#[derive(Debug, Clone)]
pub enum ConsentOutcome {
    /// Redirect the browser here to complete the flow.
    Redirect(String),
    /// The same `temp_key` was already approved or denied once; per SPEC_FULL.md §4.5 this
    /// is reported as success, not an error.
    AlreadyProcessed,
    /// No pending authorization exists for this key (expired or never existed).
    NotFound,
}

/// Outcome of a federated provider callback.
pub enum CallbackOutcome {
    /// Identity resolved; redirect the browser to the consent page.
    Redirect(String),
    /// Failure before a trustworthy `redirect_uri` was available.
    Page(String),
}

struct UsedCodeEntry {
    access_token: String,
    refresh_token: String,
    expires_at: Timestamp,
}

/// Composes the Persistent Store, Token Minter, Scope Policy, and a single configured
/// Provider Adapter into the end-to-end authorization-code state machine (SPEC_FULL.md
/// §4.5). Holds two small transient caches beyond the Store itself: one to answer a
/// doubly-submitted consent decision with "already processed" instead of an error, and one
/// to detect authorization-code replay after the code row has already been deleted on
/// first use (SPEC_FULL.md §3 invariant: a reused code "SHOULD also revoke any tokens
/// already issued from it").
pub struct Orchestrator {
    store: Arc<Store>,
    minter: TokenMinter,
    scopes: ScopePolicy,
    adapter: Box<dyn ProviderAdapter>,
    config: Arc<ServerConfig>,
    consent_log: Mutex<HashMap<String, Timestamp>>,
    used_codes: Mutex<HashMap<String, UsedCodeEntry>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(store: Arc<Store>, config: Arc<ServerConfig>) -> Self {
        let adapter = provider::build_adapter(&config.oauth2, &config.issuer_url);
        let scopes = ScopePolicy::new(
            config.oauth2.valid_scopes.clone(),
            config.oauth2.default_scopes.clone(),
        );
        Self {
            store,
            minter: TokenMinter::new(),
            scopes,
            adapter,
            config,
            consent_log: Mutex::new(HashMap::new()),
            used_codes: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }

    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.adapter.name()
    }

    #[must_use]
    pub fn discovery_metadata(&self) -> serde_json::Value {
        let issuer = &self.config.issuer_url;
        serde_json::json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{issuer}/authorize"),
            "token_endpoint": format!("{issuer}/token"),
            "registration_endpoint": format!("{issuer}/register"),
            "revocation_endpoint": format!("{issuer}/revoke"),
            "grant_types_supported": ["authorization_code", "refresh_token"],
            "response_types_supported": ["code"],
            "code_challenge_methods_supported": ["S256", "plain"],
            "scopes_supported": self.config.oauth2.valid_scopes,
            "token_endpoint_auth_methods_supported": ["client_secret_post", "none"],
        })
    }

    // -- Registration -----------------------------------------------------------

    /// # Errors
    /// Returns `invalid_request` if `redirect_uris` is empty or malformed, or
    /// `invalid_scope` if the requested default scope is not whitelisted.
    pub async fn register_client(
        &self,
        req: ClientRegistrationRequest,
    ) -> Result<ClientRegistrationResponse, OAuth2Error> {
        if req.redirect_uris.is_empty() {
            return Err(OAuth2Error::invalid_request(
                "at least one redirect_uri is required",
            ));
        }
        for uri in &req.redirect_uris {
            if !is_plausible_redirect_uri(uri) {
                return Err(OAuth2Error::invalid_request(format!(
                    "invalid redirect_uri: {uri}"
                )));
            }
        }

        let grant_types = req.grant_types.unwrap_or_else(|| {
            vec!["authorization_code".to_owned(), "refresh_token".to_owned()]
        });
        for gt in &grant_types {
            if gt != "authorization_code" && gt != "refresh_token" {
                return Err(OAuth2Error::invalid_request(format!(
                    "unsupported grant_type: {gt}"
                )));
            }
        }

        let scope = self
            .scopes
            .resolve(req.scope.as_deref())
            .map_err(|bad| OAuth2Error::invalid_scope(format!("unknown scope: {bad}")))?;

        let client_id = format!("client_{}", Uuid::new_v4().simple());
        let client = Client {
            client_id: client_id.clone(),
            client_name: req.client_name.clone(),
            redirect_uris: req.redirect_uris.clone(),
            grant_types: grant_types.clone(),
            scope: Some(scope.join(" ")),
            client_secret_hash: None,
            created_at: Timestamp::now(),
        };

        self.store
            .put_client(client)
            .await
            .map_err(|e| OAuth2Error::server_error(e.message))?;

        info!(client_id = %client_id, "client registered");

        Ok(ClientRegistrationResponse {
            client_id,
            client_name: req.client_name,
            redirect_uris: req.redirect_uris,
            grant_types,
            response_types: vec!["code".to_owned()],
            scope: scope.join(" "),
        })
    }

    // -- Authorization entry point ------------------------------------------------

    /// Validate an `/authorize` request and create the `PendingAuthorization`, returning
    /// the URL the browser should be redirected to next (consent page or upstream IdP).
    ///
    /// # Errors
    /// `Err(UnvalidatedRequestError)` for failures before `redirect_uri` is trusted;
    /// `Err(ValidatedRedirectError)` (a fully-formed redirect URL) afterward.
    pub async fn begin_authorize(
        &self,
        req: &crate::http::models::AuthorizeRequest,
    ) -> Result<String, AuthorizeFailure> {
        let client = self
            .store
            .get_client(&req.client_id)
            .await
            .ok_or_else(|| AuthorizeFailure::unvalidated("unknown client_id"))?;

        if !client
            .redirect_uris
            .iter()
            .any(|registered| redirect_uri_matches(registered, &req.redirect_uri))
        {
            return Err(AuthorizeFailure::unvalidated(
                "redirect_uri is not registered for this client",
            ));
        }

        // From here on, redirect_uri is trusted: failures redirect with OAuth error params.
        let fail = |err: OAuth2Error| {
            AuthorizeFailure::Validated(ValidatedRedirectError(front_channel_redirect(
                &req.redirect_uri,
                &err,
                req.state.as_deref(),
            )))
        };

        if req.response_type != "code" {
            return Err(fail(OAuth2Error::invalid_request(
                "only response_type=code is supported",
            )));
        }

        let Some(code_challenge) = req.code_challenge.clone() else {
            return Err(fail(OAuth2Error::invalid_request(
                "code_challenge is required (PKCE)",
            )));
        };
        let method_str = req
            .code_challenge_method
            .clone()
            .unwrap_or_else(|| "S256".to_owned());
        if ChallengeMethod::parse(&method_str).is_none() {
            return Err(fail(OAuth2Error::invalid_request(
                "code_challenge_method must be S256 or plain",
            )));
        }

        let scopes = self
            .scopes
            .resolve(req.scope.as_deref())
            .map_err(|bad| fail(OAuth2Error::invalid_scope(format!("unknown scope: {bad}"))))?;

        let temp_key = self
            .minter
            .temp_key()
            .map_err(|e| fail(OAuth2Error::server_error(e.message)))?;

        let pending = PendingAuthorization {
            temp_key: temp_key.clone(),
            client_id: client.client_id,
            scopes,
            code_challenge,
            code_challenge_method: method_str,
            redirect_uri: req.redirect_uri.clone(),
            redirect_uri_provided_explicitly: true,
            resource: req.resource.clone(),
            original_state: req.state.clone(),
            user_info: None,
            expires_at: Timestamp::plus_seconds(defaults::PENDING_TTL_SECS),
        };
        self.store
            .save_pending(pending)
            .await
            .map_err(|e| fail(OAuth2Error::server_error(e.message)))?;

        Ok(self.adapter.initiate_authn(&temp_key))
    }

    // -- Local adapter login leg ---------------------------------------------------

    /// # Errors
    /// Returns `None` if `temp_key` does not reference a live pending authorization.
    pub async fn complete_local_login(&self, temp_key: &str, identifier: &str) -> Option<String> {
        let mut pending = self.store.get_pending(temp_key).await?;
        pending.user_info = Some(
            crate::provider::local::LocalAdapter::user_info_from_identifier(identifier),
        );
        if let Err(e) = self.store.save_pending(pending).await {
            warn!(error = %e, "failed to persist local login identity");
            return None;
        }
        Some(format!("/oauth/consent/page?temp_key={temp_key}"))
    }

    // -- Federated callback leg -----------------------------------------------------

    /// Complete a federated provider's callback leg. `state` is the `temp_key` dispatched
    /// at `initiate_authn` time (SPEC_FULL.md §4.4: never the downstream client's own
    /// `state`, which travels only inside the `PendingAuthorization`).
    pub async fn complete_provider_callback(
        &self,
        state: &str,
        code: Option<&str>,
        idp_error: Option<&str>,
    ) -> CallbackOutcome {
        let Some(pending) = self.store.get_pending(state).await else {
            return CallbackOutcome::Page(
                "authorization request not found or has expired".to_owned(),
            );
        };

        if let Some(err) = idp_error {
            let redirect = front_channel_redirect(
                &pending.redirect_uri,
                &OAuth2Error::server_error(format!("upstream identity provider error: {err}")),
                pending.original_state.as_deref(),
            );
            return CallbackOutcome::Redirect(redirect);
        }

        let Some(code) = code else {
            let redirect = front_channel_redirect(
                &pending.redirect_uri,
                &OAuth2Error::server_error("identity provider callback missing code"),
                pending.original_state.as_deref(),
            );
            return CallbackOutcome::Redirect(redirect);
        };

        match self.adapter.handle_callback(code).await {
            Ok(user_info) => {
                let mut pending = pending;
                pending.user_info = Some(user_info);
                if let Err(e) = self.store.save_pending(pending).await {
                    return CallbackOutcome::Page(format!("failed to persist identity: {e}"));
                }
                CallbackOutcome::Redirect(format!("/oauth/consent/page?temp_key={state}"))
            }
            Err(e) => {
                let redirect = front_channel_redirect(
                    &pending.redirect_uri,
                    &OAuth2Error::server_error(e.message),
                    pending.original_state.as_deref(),
                );
                CallbackOutcome::Redirect(redirect)
            }
        }
    }

    // -- Consent ------------------------------------------------------------------

    /// Fetch the pending authorization and its client's display name, for rendering the
    /// consent form. Returns `None` if the key is unknown or expired.
    pub async fn consent_context(&self, temp_key: &str) -> Option<(PendingAuthorization, Option<String>)> {
        let pending = self.store.get_pending(temp_key).await?;
        let client_name = self
            .store
            .get_client(&pending.client_id)
            .await
            .and_then(|c| c.client_name);
        Some((pending, client_name))
    }

    /// # Errors
    /// Never returns `Err`; storage failures are reported through `ConsentOutcome` instead
    /// so the HTTP layer can still render a response.
    pub async fn approve(&self, temp_key: &str) -> ConsentOutcome {
        if self.already_processed(temp_key).await {
            return ConsentOutcome::AlreadyProcessed;
        }
        let Some(pending) = self.store.delete_pending(temp_key).await.ok().flatten() else {
            return ConsentOutcome::NotFound;
        };
        self.mark_processed(temp_key).await;

        let code = match self.minter.auth_code() {
            Ok(c) => c,
            Err(e) => {
                return ConsentOutcome::Redirect(front_channel_redirect(
                    &pending.redirect_uri,
                    &OAuth2Error::server_error(e.message),
                    pending.original_state.as_deref(),
                ))
            }
        };
        let auth_code = AuthorizationCode {
            code: code.clone(),
            client_id: pending.client_id,
            scopes: pending.scopes,
            code_challenge: pending.code_challenge,
            code_challenge_method: pending.code_challenge_method,
            redirect_uri: pending.redirect_uri.clone(),
            redirect_uri_provided_explicitly: pending.redirect_uri_provided_explicitly,
            resource: pending.resource,
            user_info: pending.user_info,
            expires_at: Timestamp::plus_seconds(self.config.oauth2.auth_code_ttl_secs),
        };
        if let Err(e) = self.store.save_code(auth_code).await {
            return ConsentOutcome::Redirect(front_channel_redirect(
                &pending.redirect_uri,
                &OAuth2Error::server_error(e.message),
                pending.original_state.as_deref(),
            ));
        }

        let mut redirect = pending.redirect_uri;
        redirect = append_query(&redirect, &format!("code={}", urlencoding::encode(&code)));
        if let Some(state) = pending.original_state {
            redirect = append_query(&redirect, &format!("state={}", urlencoding::encode(&state)));
        }
        ConsentOutcome::Redirect(redirect)
    }

    pub async fn deny(&self, temp_key: &str) -> ConsentOutcome {
        if self.already_processed(temp_key).await {
            return ConsentOutcome::AlreadyProcessed;
        }
        let Some(pending) = self.store.delete_pending(temp_key).await.ok().flatten() else {
            return ConsentOutcome::NotFound;
        };
        self.mark_processed(temp_key).await;

        let redirect = front_channel_redirect(
            &pending.redirect_uri,
            &OAuth2Error::access_denied("the user denied the authorization request"),
            pending.original_state.as_deref(),
        );
        ConsentOutcome::Redirect(redirect)
    }

    async fn already_processed(&self, temp_key: &str) -> bool {
        let mut log = self.consent_log.lock().await;
        log.retain(|_, expires_at| !expires_at.is_expired());
        log.contains_key(temp_key)
    }

    async fn mark_processed(&self, temp_key: &str) {
        let mut log = self.consent_log.lock().await;
        log.insert(
            temp_key.to_owned(),
            Timestamp::plus_seconds(defaults::PENDING_TTL_SECS),
        );
    }

    // -- Token endpoint -------------------------------------------------------------

    /// # Errors
    /// Returns an `OAuth2Error` per RFC 6749 for every rejected request.
    pub async fn token(&self, req: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        let client_id = req
            .client_id
            .as_deref()
            .ok_or_else(|| OAuth2Error::invalid_request("missing client_id"))?;
        let client = self
            .store
            .get_client(client_id)
            .await
            .ok_or_else(|| OAuth2Error::invalid_client("unknown client_id"))?;
        self.authenticate_client(&client, req.client_secret.as_deref())?;

        if !client.grant_types.iter().any(|g| g == &req.grant_type) {
            return Err(OAuth2Error::unauthorized_client(format!(
                "client is not authorized for grant_type={}",
                req.grant_type
            )));
        }

        match req.grant_type.as_str() {
            "authorization_code" => self.exchange_authorization_code(&client, req).await,
            "refresh_token" => self.exchange_refresh_token(&client, req).await,
            other => Err(OAuth2Error::unsupported_grant_type(format!(
                "unsupported grant_type: {other}"
            ))),
        }
    }

    fn authenticate_client(&self, client: &Client, provided_secret: Option<&str>) -> Result<(), OAuth2Error> {
        let Some(expected_hash) = &client.client_secret_hash else {
            // Public client: PKCE carries the proof of possession instead (SPEC_FULL.md §9).
            return Ok(());
        };
        let Some(provided) = provided_secret else {
            return Err(OAuth2Error::invalid_client("client_secret is required"));
        };
        if token::constant_time_hash_eq(provided, expected_hash) {
            Ok(())
        } else {
            Err(OAuth2Error::invalid_client("client authentication failed"))
        }
    }

    async fn exchange_authorization_code(
        &self,
        client: &Client,
        req: TokenRequest,
    ) -> Result<TokenResponse, OAuth2Error> {
        let code = req
            .code
            .as_deref()
            .ok_or_else(|| OAuth2Error::invalid_request("missing code"))?;
        let redirect_uri = req
            .redirect_uri
            .as_deref()
            .ok_or_else(|| OAuth2Error::invalid_request("missing redirect_uri"))?;

        let Some(ac) = self.store.get_code(code).await else {
            return Err(self.reject_replayed_code(code).await);
        };

        if ac.client_id != client.client_id {
            return Err(OAuth2Error::invalid_grant("code was not issued to this client"));
        }
        if ac.redirect_uri_provided_explicitly && ac.redirect_uri != redirect_uri {
            return Err(OAuth2Error::invalid_grant("redirect_uri does not match"));
        }

        let method = ChallengeMethod::parse(&ac.code_challenge_method).unwrap_or(ChallengeMethod::S256);
        let verifier = req
            .code_verifier
            .as_deref()
            .ok_or_else(|| OAuth2Error::invalid_grant("code_verifier is required (PKCE)"))?;
        if !token::is_valid_code_verifier(verifier)
            || !token::verify_pkce(method, verifier, &ac.code_challenge)
        {
            return Err(OAuth2Error::invalid_grant("code_verifier does not match code_challenge"));
        }

        // Consume the code before minting tokens: a reused code must never mint twice
        // (SPEC_FULL.md §3 invariant, §9 anti-pattern note on ordering).
        self.store
            .delete_code(code)
            .await
            .map_err(|e| OAuth2Error::server_error(e.message))?;

        let access_token = self.minter.access_token().map_err(|e| OAuth2Error::server_error(e.message))?;
        let refresh_token = self.minter.refresh_token().map_err(|e| OAuth2Error::server_error(e.message))?;
        let access_expires_at = Timestamp::plus_seconds(self.config.oauth2.access_token_ttl_secs);
        let refresh_expires_at = Timestamp::plus_seconds(self.config.oauth2.refresh_token_ttl_secs);

        self.store
            .add_access_token(AccessToken {
                token: access_token.clone(),
                client_id: client.client_id.clone(),
                scopes: ac.scopes.clone(),
                resource: ac.resource.clone(),
                expires_at: access_expires_at,
            })
            .await
            .map_err(|e| OAuth2Error::server_error(e.message))?;
        self.store
            .add_refresh_token(RefreshToken {
                token: refresh_token.clone(),
                client_id: client.client_id.clone(),
                scopes: ac.scopes.clone(),
                expires_at: refresh_expires_at,
            })
            .await
            .map_err(|e| OAuth2Error::server_error(e.message))?;

        self.remember_used_code(code, &access_token, &refresh_token).await;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer",
            expires_in: self.config.oauth2.access_token_ttl_secs,
            refresh_token,
            scope: ac.scopes.join(" "),
        })
    }

    async fn remember_used_code(&self, code: &str, access_token: &str, refresh_token: &str) {
        let mut used = self.used_codes.lock().await;
        used.retain(|_, entry| !entry.expires_at.is_expired());
        used.insert(
            code.to_owned(),
            UsedCodeEntry {
                access_token: access_token.to_owned(),
                refresh_token: refresh_token.to_owned(),
                expires_at: Timestamp::plus_seconds(self.config.oauth2.auth_code_ttl_secs),
            },
        );
    }

    /// A code presented at `/token` that is absent from the store is either unknown or
    /// already exchanged. When it matches a remembered prior exchange, revoke the tokens
    /// that exchange minted (SPEC_FULL.md §3, §8 scenario 5).
    async fn reject_replayed_code(&self, code: &str) -> OAuth2Error {
        let entry = self.used_codes.lock().await.remove(code);
        if let Some(entry) = entry {
            warn!(code = %short(code), "authorization code replay detected; revoking issued tokens");
            let _ = self.store.remove_access_token(&entry.access_token).await;
            let _ = self.store.remove_refresh_token(&entry.refresh_token).await;
            OAuth2Error::invalid_grant("authorization code already used; issued tokens revoked")
        } else {
            OAuth2Error::invalid_grant("unknown or expired authorization code")
        }
    }

    async fn exchange_refresh_token(
        &self,
        client: &Client,
        req: TokenRequest,
    ) -> Result<TokenResponse, OAuth2Error> {
        let token_value = req
            .refresh_token
            .as_deref()
            .ok_or_else(|| OAuth2Error::invalid_request("missing refresh_token"))?;

        let rt = self
            .store
            .get_refresh_token(token_value)
            .await
            .ok_or_else(|| OAuth2Error::invalid_grant("unknown or expired refresh token"))?;
        if rt.client_id != client.client_id {
            return Err(OAuth2Error::invalid_grant("refresh token was not issued to this client"));
        }

        let granted_scopes = self.scopes.downscope_for_refresh(&rt.scopes, req.scope.as_deref());

        let new_access = self.minter.access_token().map_err(|e| OAuth2Error::server_error(e.message))?;
        let new_refresh = self.minter.refresh_token().map_err(|e| OAuth2Error::server_error(e.message))?;
        let access_expires_at = Timestamp::plus_seconds(self.config.oauth2.access_token_ttl_secs);
        let refresh_expires_at = Timestamp::plus_seconds(self.config.oauth2.refresh_token_ttl_secs);

        self.store
            .rotate_refresh_token(
                token_value,
                AccessToken {
                    token: new_access.clone(),
                    client_id: client.client_id.clone(),
                    scopes: granted_scopes.clone(),
                    resource: None,
                    expires_at: access_expires_at,
                },
                RefreshToken {
                    token: new_refresh.clone(),
                    client_id: client.client_id.clone(),
                    scopes: granted_scopes.clone(),
                    expires_at: refresh_expires_at,
                },
            )
            .await
            .map_err(|e| OAuth2Error::server_error(e.message))?;

        info!(client_id = %client.client_id, "refresh token rotated");

        Ok(TokenResponse {
            access_token: new_access,
            token_type: "Bearer",
            expires_in: self.config.oauth2.access_token_ttl_secs,
            refresh_token: new_refresh,
            scope: granted_scopes.join(" "),
        })
    }

    // -- Revocation -----------------------------------------------------------------

    /// Best-effort revocation per RFC 7009: the caller always receives 200 regardless of
    /// whether the token was found, already expired, or of the wrong kind.
    pub async fn revoke(&self, req: &RevokeRequest) {
        if let Some(at) = self.store.get_access_token(&req.token).await {
            if req.client_id.as_deref().map_or(true, |cid| cid == at.client_id) {
                let _ = self.store.remove_access_token(&req.token).await;
            }
            return;
        }
        if let Some(rt) = self.store.get_refresh_token(&req.token).await {
            if req.client_id.as_deref().map_or(true, |cid| cid == rt.client_id) {
                let _ = self.store.remove_refresh_token(&req.token).await;
                let _ = self.store.remove_access_tokens_by_client(&rt.client_id).await;
            }
        }
    }
}

/// Failure returned by [`Orchestrator::begin_authorize`].
pub enum AuthorizeFailure {
    Unvalidated(UnvalidatedRequestError),
    Validated(ValidatedRedirectError),
}

impl AuthorizeFailure {
    fn unvalidated(message: impl Into<String>) -> Self {
        Self::Unvalidated(UnvalidatedRequestError(message.into()))
    }
}

fn short(s: &str) -> String {
    s.chars().take(8).collect::<String>() + "..."
}

/// RFC 6749 §3.1.2.2 exact match, with the SPEC_FULL.md §4.5 carve-out that an empty path
/// is treated as equivalent to a single `/` (so `http://x` and `http://x/` are the same
/// registration).
fn redirect_uri_matches(registered: &str, candidate: &str) -> bool {
    if registered == candidate {
        return true;
    }
    match (url::Url::parse(registered), url::Url::parse(candidate)) {
        (Ok(a), Ok(b)) => {
            a.scheme() == b.scheme()
                && a.host_str() == b.host_str()
                && a.port_or_known_default() == b.port_or_known_default()
                && normalize_empty_path(a.path()) == normalize_empty_path(b.path())
                && a.query() == b.query()
                && a.fragment() == b.fragment()
        }
        _ => false,
    }
}

fn normalize_empty_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

fn is_plausible_redirect_uri(uri: &str) -> bool {
    if uri == "urn:ietf:wg:oauth:2.0:oob" {
        return true;
    }
    let Ok(parsed) = url::Url::parse(uri) else {
        return false;
    };
    matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
}

fn append_query(base: &str, extra: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}{extra}")
}

/// Build a front-channel redirect carrying an OAuth error and, when present, the caller's
/// original `state` verbatim (SPEC_FULL.md §8 "State fidelity").
fn front_channel_redirect(redirect_uri: &str, err: &OAuth2Error, state: Option<&str>) -> String {
    let mut url = append_query(redirect_uri, &err.to_query_params());
    if let Some(state) = state {
        url = append_query(&url, &format!("state={}", urlencoding::encode(state)));
    }
    url
}
