// ABOUTME: Provider Adapter capability interface and concrete local/Google/Azure adapters
// ABOUTME: Each adapter binds the downstream client's state to a temp_key before any
// ABOUTME: round-trip to an upstream identity provider, never forwarding it verbatim
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod azure;
pub mod google;
pub mod local;

use async_trait::async_trait;

use crate::config::OAuth2ServerConfig;
use crate::errors::AppError;
use crate::store::models::UserInfo;

/// Capability interface for an identity source (SPEC_FULL.md §4.4 / §9: this plays the
/// role the source's abstract provider base class played, but as a trait object composed
/// by the orchestrator rather than a class hierarchy).
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Short machine-readable name, used in logs and the provider-info surface.
    fn name(&self) -> &'static str;

    /// Build the URL the end user's browser should be sent to in order to authenticate.
    /// `temp_key` is the opaque handle the orchestrator has already bound to the
    /// in-flight `PendingAuthorization`; federated adapters send it upstream as `state`.
    fn initiate_authn(&self, temp_key: &str) -> String;

    /// Complete an upstream round-trip: exchange the authorization `code` for tokens,
    /// then resolve the end user's identity. Only meaningful for federated adapters;
    /// the local adapter has no external round-trip and returns an error if called.
    ///
    /// # Errors
    /// Returns an error if the upstream exchange or user-info fetch fails, or if this
    /// adapter has no callback leg.
    async fn handle_callback(&self, code: &str) -> Result<UserInfo, AppError>;
}

/// Build the adapter selected by configuration.
#[must_use]
pub fn build_adapter(config: &OAuth2ServerConfig, issuer_url: &str) -> Box<dyn ProviderAdapter> {
    match config.provider {
        crate::config::ProviderKind::Custom => Box::new(local::LocalAdapter::new()),
        crate::config::ProviderKind::Google => Box::new(google::GoogleAdapter::new(
            config.client_id.clone().unwrap_or_default(),
            config.client_secret.clone().unwrap_or_default(),
            format!("{issuer_url}/oauth/google/callback"),
        )),
        crate::config::ProviderKind::Azure => Box::new(azure::AzureAdapter::new(
            config.client_id.clone().unwrap_or_default(),
            config.client_secret.clone().unwrap_or_default(),
            config.tenant_id.clone(),
            format!("{issuer_url}/oauth/azure/callback"),
        )),
    }
}
