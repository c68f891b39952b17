// ABOUTME: Local demo identity adapter: no external round-trip, any submitted identifier
// ABOUTME: is treated as authenticated (SPEC_FULL.md Non-goals)
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use async_trait::async_trait;

use super::ProviderAdapter;
use crate::errors::AppError;
use crate::store::models::UserInfo;

/// Built-in demo provider. `initiate_authn` points at this server's own login page, which
/// collects an identifier and advances straight to consent; the identity comes from
/// whatever that form submits, not from a third party.
pub struct LocalAdapter;

impl Default for LocalAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build a `UserInfo` from whatever identifier the consent form submitted. The demo
    /// adapter performs no credential verification (SPEC_FULL.md Non-goals).
    #[must_use]
    pub fn user_info_from_identifier(identifier: &str) -> UserInfo {
        UserInfo {
            subject: identifier.to_owned(),
            email: None,
            name: Some(identifier.to_owned()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for LocalAdapter {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn initiate_authn(&self, temp_key: &str) -> String {
        format!("/oauth/login?temp_key={temp_key}")
    }

    async fn handle_callback(&self, _code: &str) -> Result<UserInfo, AppError> {
        Err(AppError::internal(
            "local adapter has no external callback leg",
        ))
    }
}
