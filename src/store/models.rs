// ABOUTME: Persisted entity definitions for the OAuth authorization server
// ABOUTME: Client, PendingAuthorization, AuthorizationCode, AccessToken, RefreshToken
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered OAuth client (RFC 7591). Never mutated after registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    pub client_name: Option<String>,
    pub redirect_uris: Vec<String>,
    pub grant_types: Vec<String>,
    pub scope: Option<String>,
    pub client_secret_hash: Option<String>,
    pub created_at: Timestamp,
}

/// Identity asserted by a Provider Adapter once authentication completes. Modeled as an
/// explicit field everywhere it needs to travel, never attached to a record after the
/// fact (SPEC_FULL.md §9: no attribute-mutation side channel).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// An in-flight authorization request, keyed by an opaque `temp_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub temp_key: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub redirect_uri: String,
    pub redirect_uri_provided_explicitly: bool,
    pub resource: Option<String>,
    /// The downstream client's original `state`, re-emitted verbatim on the final
    /// redirect regardless of adapter or outcome.
    pub original_state: Option<String>,
    /// Identity resolved by the Provider Adapter (local login form or federated
    /// callback), carried as an explicit field so it survives from authentication
    /// through to consent without attribute-mutating the record (SPEC_FULL.md §9).
    pub user_info: Option<UserInfo>,
    pub expires_at: Timestamp,
}

/// A one-time authorization code, exchanged exactly once at `/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub redirect_uri: String,
    pub redirect_uri_provided_explicitly: bool,
    pub resource: Option<String>,
    /// Identity resolved by the Provider Adapter, carried explicitly rather than
    /// attribute-mutated onto the record (SPEC_FULL.md §9).
    pub user_info: Option<UserInfo>,
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub resource: Option<String>,
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub token: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub expires_at: Timestamp,
}

/// POSIX-seconds timestamp that round-trips whether the on-disk representation is an
/// integer or a float (SPEC_FULL.md §9: the source tolerates both; we accept both and
/// always emit integer seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub i64);

impl Timestamp {
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    #[must_use]
    pub fn plus_seconds(secs: i64) -> Self {
        Self(Utc::now().timestamp() + secs)
    }

    #[must_use]
    pub fn is_expired(self) -> bool {
        self.0 < Utc::now().timestamp()
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum NumberOrString {
            Int(i64),
            Float(f64),
        }

        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Int(i) => Ok(Self(i)),
            // Truncate rather than round: a fractional expiry should not round up past
            // the instant it actually expires.
            NumberOrString::Float(f) => Ok(Self(f.trunc() as i64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_accepts_integer_and_float_json() {
        let from_int: Timestamp = serde_json::from_str("1700000000").unwrap();
        let from_float: Timestamp = serde_json::from_str("1700000000.5").unwrap();
        assert_eq!(from_int.0, 1_700_000_000);
        assert_eq!(from_float.0, 1_700_000_000);
    }

    #[test]
    fn timestamp_emits_integer() {
        let ts = Timestamp(42);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "42");
    }

    #[test]
    fn is_expired_detects_past_timestamps() {
        assert!(Timestamp(0).is_expired());
        assert!(!Timestamp::plus_seconds(3600).is_expired());
    }
}
