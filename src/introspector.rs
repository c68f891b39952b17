// ABOUTME: Bearer Introspector: validate an access token for the fronted MCP resource
// ABOUTME: server. Pure store lookup, no network fan-out (SPEC_FULL.md §4.7).
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use crate::store::models::Timestamp;
use crate::store::Store;

/// Result of a successful introspection, carrying exactly what a resource server needs
/// to authorize a request: who the token was issued to, what it can do, and until when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Introspection {
    pub client_id: String,
    pub scopes: Vec<String>,
    pub resource: Option<String>,
    pub expires_at: i64,
}

/// Looks up a bearer token in the Persistent Store. Holds no state of its own beyond a
/// store handle; every call is a single lookup plus an expiry check.
pub struct Introspector {
    store: Arc<Store>,
}

impl Introspector {
    #[must_use]
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Returns `None` for an unknown, expired, or malformed token. Never distinguishes
    /// those cases to the caller: a resource server only needs "valid" or "not".
    pub async fn introspect(&self, token: &str) -> Option<Introspection> {
        let access_token = self.store.get_access_token(token).await?;
        if access_token.expires_at.is_expired() {
            return None;
        }
        Some(Introspection {
            client_id: access_token.client_id,
            scopes: access_token.scopes,
            resource: access_token.resource,
            expires_at: timestamp_seconds(access_token.expires_at),
        })
    }
}

fn timestamp_seconds(ts: Timestamp) -> i64 {
    ts.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::AccessToken;

    async fn store_with_token(token: &str, expires_at: Timestamp) -> (tempfile::TempDir, Arc<Store>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::load(dir.path(), "read").await.unwrap();
        store
            .add_access_token(AccessToken {
                token: token.to_owned(),
                client_id: "client_abc".to_owned(),
                scopes: vec!["read".to_owned()],
                resource: Some("https://mcp.example.com".to_owned()),
                expires_at,
            })
            .await
            .unwrap();
        (dir, Arc::new(store))
    }

    #[tokio::test]
    async fn live_token_introspects_successfully() {
        let (_dir, store) = store_with_token("tok1", Timestamp::plus_seconds(3600)).await;
        let introspector = Introspector::new(store);
        let result = introspector.introspect("tok1").await.unwrap();
        assert_eq!(result.client_id, "client_abc");
        assert_eq!(result.scopes, vec!["read".to_owned()]);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let (_dir, store) = store_with_token("tok2", Timestamp(0)).await;
        let introspector = Introspector::new(store);
        assert!(introspector.introspect("tok2").await.is_none());
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::load(dir.path(), "read").await.unwrap());
        let introspector = Introspector::new(store);
        assert!(introspector.introspect("nope").await.is_none());
    }
}
