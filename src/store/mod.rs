// ABOUTME: Persistent JSON-file-backed store for clients, pending authorizations, codes,
// ABOUTME: and tokens. Single mutex writer guarantee; write-temp-then-rename on every mutation.
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod models;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use models::{AccessToken, AuthorizationCode, Client, PendingAuthorization, RefreshToken};

const CLIENTS_FILE: &str = "clients.json";
const REFRESH_TOKENS_FILE: &str = "refresh_tokens.json";
const ACCESS_TOKENS_FILE: &str = "access_tokens.json";
const AUTH_CODES_FILE: &str = "auth_codes.json";
/// Pending authorizations share the auth_codes namespace on disk (SPEC_FULL.md §6:
/// `auth_codes.json` is "keyed by code or `pending_<temp>`"), but are split into their
/// own map in memory since their record shape differs.
const PENDING_KEY_PREFIX: &str = "pending_";

struct StoreState {
    clients: HashMap<String, Client>,
    pending: HashMap<String, PendingAuthorization>,
    codes: HashMap<String, AuthorizationCode>,
    access_tokens: HashMap<String, AccessToken>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

/// Durable store for every long-lived OAuth entity. All mutation paths go through a
/// single `tokio::sync::Mutex`, so a mutation is observable in memory only after it has
/// been durably persisted to disk (SPEC_FULL.md §5).
pub struct Store {
    dir: PathBuf,
    state: Mutex<StoreState>,
}

impl Store {
    /// Load the store from `dir`, creating it if necessary. Records missing required
    /// fields are skipped with a warning; a `Client` missing `scope` is backfilled with
    /// `default_scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be created or an existing file cannot be read.
    pub async fn load(dir: impl Into<PathBuf>, default_scope: &str) -> Result<Self, AppError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::storage(format!("failed to create store dir: {e}")))?;

        let mut clients: HashMap<String, Client> = load_map(&dir, CLIENTS_FILE).await?;
        for client in clients.values_mut() {
            if client.scope.as_deref().unwrap_or_default().trim().is_empty() {
                client.scope = Some(default_scope.to_owned());
            }
        }

        let codes_and_pending: HashMap<String, serde_json::Value> =
            load_map(&dir, AUTH_CODES_FILE).await?;
        let mut pending = HashMap::new();
        let mut codes = HashMap::new();
        for (key, value) in codes_and_pending {
            if let Some(temp_key) = key.strip_prefix(PENDING_KEY_PREFIX) {
                match serde_json::from_value::<PendingAuthorization>(value) {
                    Ok(p) if !p.expires_at.is_expired() => {
                        pending.insert(temp_key.to_owned(), p);
                    }
                    Ok(_) => debug!(key, "dropping expired pending authorization at load"),
                    Err(e) => warn!(key, error = %e, "skipping malformed pending authorization"),
                }
            } else {
                match serde_json::from_value::<AuthorizationCode>(value) {
                    Ok(c) if !c.expires_at.is_expired() => {
                        codes.insert(key, c);
                    }
                    Ok(_) => debug!(key, "dropping expired authorization code at load"),
                    Err(e) => warn!(key, error = %e, "skipping malformed authorization code"),
                }
            }
        }

        let access_tokens = load_unexpired_map(&dir, ACCESS_TOKENS_FILE, |t: &AccessToken| {
            t.expires_at.is_expired()
        })
        .await?;
        let refresh_tokens = load_unexpired_map(&dir, REFRESH_TOKENS_FILE, |t: &RefreshToken| {
            t.expires_at.is_expired()
        })
        .await?;

        info!(
            clients = clients.len(),
            pending = pending.len(),
            codes = codes.len(),
            access_tokens = access_tokens.len(),
            refresh_tokens = refresh_tokens.len(),
            dir = %dir.display(),
            "persistent store loaded"
        );

        Ok(Self {
            dir,
            state: Mutex::new(StoreState {
                clients,
                pending,
                codes,
                access_tokens,
                refresh_tokens,
            }),
        })
    }

    // -- Clients ---------------------------------------------------------------

    /// # Errors
    /// Returns an error if the client file cannot be durably persisted.
    pub async fn put_client(&self, client: Client) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.clients.insert(client.client_id.clone(), client);
        write_map(&self.dir, CLIENTS_FILE, &state.clients).await
    }

    pub async fn get_client(&self, client_id: &str) -> Option<Client> {
        self.state.lock().await.clients.get(client_id).cloned()
    }

    // -- Pending authorizations --------------------------------------------------

    /// # Errors
    /// Returns an error if the combined auth-code/pending file cannot be persisted.
    pub async fn save_pending(&self, pending: PendingAuthorization) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.pending.insert(pending.temp_key.clone(), pending);
        persist_codes_and_pending(&self.dir, &state.codes, &state.pending).await
    }

    pub async fn get_pending(&self, temp_key: &str) -> Option<PendingAuthorization> {
        let mut state = self.state.lock().await;
        sweep_locked(&mut state);
        state.pending.get(temp_key).cloned()
    }

    /// # Errors
    /// Returns an error if the combined auth-code/pending file cannot be persisted.
    pub async fn delete_pending(&self, temp_key: &str) -> Result<Option<PendingAuthorization>, AppError> {
        let mut state = self.state.lock().await;
        let removed = state.pending.remove(temp_key);
        if removed.is_some() {
            persist_codes_and_pending(&self.dir, &state.codes, &state.pending).await?;
        }
        Ok(removed)
    }

    // -- Authorization codes ------------------------------------------------------

    /// # Errors
    /// Returns an error if the combined auth-code/pending file cannot be persisted.
    pub async fn save_code(&self, code: AuthorizationCode) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.codes.insert(code.code.clone(), code);
        persist_codes_and_pending(&self.dir, &state.codes, &state.pending).await
    }

    pub async fn get_code(&self, code: &str) -> Option<AuthorizationCode> {
        let mut state = self.state.lock().await;
        sweep_locked(&mut state);
        state.codes.get(code).cloned()
    }

    /// # Errors
    /// Returns an error if the combined auth-code/pending file cannot be persisted.
    pub async fn delete_code(&self, code: &str) -> Result<Option<AuthorizationCode>, AppError> {
        let mut state = self.state.lock().await;
        let removed = state.codes.remove(code);
        if removed.is_some() {
            persist_codes_and_pending(&self.dir, &state.codes, &state.pending).await?;
        }
        Ok(removed)
    }

    // -- Access tokens --------------------------------------------------------

    /// # Errors
    /// Returns an error if the access-token file cannot be durably persisted.
    pub async fn add_access_token(&self, token: AccessToken) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.access_tokens.insert(token.token.clone(), token);
        write_map(&self.dir, ACCESS_TOKENS_FILE, &state.access_tokens).await
    }

    pub async fn get_access_token(&self, token: &str) -> Option<AccessToken> {
        let mut state = self.state.lock().await;
        sweep_locked(&mut state);
        state.access_tokens.get(token).cloned()
    }

    /// # Errors
    /// Returns an error if the access-token file cannot be durably persisted.
    pub async fn remove_access_token(&self, token: &str) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        let removed = state.access_tokens.remove(token).is_some();
        if removed {
            write_map(&self.dir, ACCESS_TOKENS_FILE, &state.access_tokens).await?;
        }
        Ok(removed)
    }

    /// # Errors
    /// Returns an error if the access-token file cannot be durably persisted.
    pub async fn remove_access_tokens_by_client(&self, client_id: &str) -> Result<usize, AppError> {
        let mut state = self.state.lock().await;
        let before = state.access_tokens.len();
        state.access_tokens.retain(|_, t| t.client_id != client_id);
        let removed = before - state.access_tokens.len();
        if removed > 0 {
            write_map(&self.dir, ACCESS_TOKENS_FILE, &state.access_tokens).await?;
        }
        Ok(removed)
    }

    // -- Refresh tokens -------------------------------------------------------

    /// # Errors
    /// Returns an error if the refresh-token file cannot be durably persisted.
    pub async fn add_refresh_token(&self, token: RefreshToken) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.refresh_tokens.insert(token.token.clone(), token);
        write_map(&self.dir, REFRESH_TOKENS_FILE, &state.refresh_tokens).await
    }

    pub async fn get_refresh_token(&self, token: &str) -> Option<RefreshToken> {
        let mut state = self.state.lock().await;
        sweep_locked(&mut state);
        state.refresh_tokens.get(token).cloned()
    }

    /// # Errors
    /// Returns an error if the refresh-token file cannot be durably persisted.
    pub async fn remove_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        let mut state = self.state.lock().await;
        let removed = state.refresh_tokens.remove(token);
        if removed.is_some() {
            write_map(&self.dir, REFRESH_TOKENS_FILE, &state.refresh_tokens).await?;
        }
        Ok(removed)
    }

    /// Atomically consume the old refresh token and install the new access/refresh pair:
    /// both happen under one lock acquisition, so no intermediate state (old gone, new
    /// absent; or old present, new already visible) is observable (SPEC_FULL.md §8
    /// "Rotation atomicity").
    ///
    /// # Errors
    /// Returns an error if either file fails to persist; the in-memory maps are updated
    /// regardless (SPEC_FULL.md §4.1 failure semantics: no rollback, re-persist next time).
    pub async fn rotate_refresh_token(
        &self,
        old_token: &str,
        new_access: AccessToken,
        new_refresh: RefreshToken,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.refresh_tokens.remove(old_token);
        state
            .refresh_tokens
            .insert(new_refresh.token.clone(), new_refresh);
        state
            .access_tokens
            .insert(new_access.token.clone(), new_access);
        write_map(&self.dir, REFRESH_TOKENS_FILE, &state.refresh_tokens).await?;
        write_map(&self.dir, ACCESS_TOKENS_FILE, &state.access_tokens).await?;
        Ok(())
    }

    /// Remove every expired record across all entity kinds. Safe to run concurrently
    /// with other mutations: it re-acquires the lock for its own pass and persists each
    /// touched file once.
    ///
    /// # Errors
    /// Returns an error if a touched file fails to persist.
    pub async fn sweep(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let touched = sweep_locked(&mut state);
        if touched.pending_or_codes {
            persist_codes_and_pending(&self.dir, &state.codes, &state.pending).await?;
        }
        if touched.access {
            write_map(&self.dir, ACCESS_TOKENS_FILE, &state.access_tokens).await?;
        }
        if touched.refresh {
            write_map(&self.dir, REFRESH_TOKENS_FILE, &state.refresh_tokens).await?;
        }
        Ok(())
    }
}

struct SweepTouched {
    pending_or_codes: bool,
    access: bool,
    refresh: bool,
}

fn sweep_locked(state: &mut StoreState) -> SweepTouched {
    let before_pending = state.pending.len();
    state.pending.retain(|_, p| !p.expires_at.is_expired());
    let before_codes = state.codes.len();
    state.codes.retain(|_, c| !c.expires_at.is_expired());
    let before_access = state.access_tokens.len();
    state.access_tokens.retain(|_, t| !t.expires_at.is_expired());
    let before_refresh = state.refresh_tokens.len();
    state.refresh_tokens.retain(|_, t| !t.expires_at.is_expired());

    SweepTouched {
        pending_or_codes: before_pending != state.pending.len() || before_codes != state.codes.len(),
        access: before_access != state.access_tokens.len(),
        refresh: before_refresh != state.refresh_tokens.len(),
    }
}

async fn persist_codes_and_pending(
    dir: &Path,
    codes: &HashMap<String, AuthorizationCode>,
    pending: &HashMap<String, PendingAuthorization>,
) -> Result<(), AppError> {
    let mut merged = serde_json::Map::new();
    for (k, v) in codes {
        merged.insert(
            k.clone(),
            serde_json::to_value(v).map_err(|e| AppError::internal(e.to_string()))?,
        );
    }
    for (k, v) in pending {
        merged.insert(
            format!("{PENDING_KEY_PREFIX}{k}"),
            serde_json::to_value(v).map_err(|e| AppError::internal(e.to_string()))?,
        );
    }
    write_json(dir, AUTH_CODES_FILE, &serde_json::Value::Object(merged)).await
}

async fn load_map<T: DeserializeOwned>(
    dir: &Path,
    file_name: &str,
) -> Result<HashMap<String, T>, AppError> {
    let path = dir.join(file_name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let raw: HashMap<String, serde_json::Value> = serde_json::from_slice(&bytes)
                .map_err(|e| AppError::storage(format!("{file_name} is not valid JSON: {e}")))?;
            let mut out = HashMap::with_capacity(raw.len());
            for (key, value) in raw {
                match serde_json::from_value::<T>(value) {
                    Ok(record) => {
                        out.insert(key, record);
                    }
                    Err(e) => warn!(file = file_name, key, error = %e, "skipping malformed record"),
                }
            }
            Ok(out)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(AppError::storage(format!("failed to read {file_name}: {e}"))),
    }
}

async fn load_unexpired_map<T: DeserializeOwned>(
    dir: &Path,
    file_name: &str,
    is_expired: impl Fn(&T) -> bool,
) -> Result<HashMap<String, T>, AppError> {
    let mut map = load_map(dir, file_name).await?;
    map.retain(|_, v| !is_expired(v));
    Ok(map)
}

async fn write_map<T: Serialize>(
    dir: &Path,
    file_name: &str,
    map: &HashMap<String, T>,
) -> Result<(), AppError> {
    let value = serde_json::to_value(map).map_err(|e| AppError::internal(e.to_string()))?;
    write_json(dir, file_name, &value).await
}

/// Write-temp-then-rename so a crash mid-write never leaves a truncated file behind
/// (SPEC_FULL.md §4.1 and §5).
async fn write_json(dir: &Path, file_name: &str, value: &serde_json::Value) -> Result<(), AppError> {
    let final_path = dir.join(file_name);
    let tmp_path = dir.join(format!("{file_name}.tmp"));
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| AppError::internal(e.to_string()))?;

    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(|e| AppError::storage(format!("failed to write {file_name}: {e}")))?;
    tokio::fs::rename(&tmp_path, &final_path)
        .await
        .map_err(|e| AppError::storage(format!("failed to rename into {file_name}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::Timestamp;

    fn sample_client(id: &str) -> Client {
        Client {
            client_id: id.to_owned(),
            client_name: Some("Test Client".to_owned()),
            redirect_uris: vec!["http://x/cb".to_owned()],
            grant_types: vec!["authorization_code".to_owned()],
            scope: None,
            client_secret_hash: None,
            created_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn durability_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = Store::load(dir.path(), "read").await.unwrap();
            store.put_client(sample_client("abc")).await.unwrap();
            store
                .add_refresh_token(RefreshToken {
                    token: "rt1".to_owned(),
                    client_id: "abc".to_owned(),
                    scopes: vec!["read".to_owned()],
                    expires_at: Timestamp::plus_seconds(3600),
                })
                .await
                .unwrap();
        }

        let reloaded = Store::load(dir.path(), "read").await.unwrap();
        let client = reloaded.get_client("abc").await.unwrap();
        assert_eq!(client.scope.as_deref(), Some("read"));
        assert!(reloaded.get_refresh_token("rt1").await.is_some());
    }

    #[tokio::test]
    async fn sweep_drops_expired_records_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::load(dir.path(), "read").await.unwrap();
        store
            .add_refresh_token(RefreshToken {
                token: "expired".to_owned(),
                client_id: "abc".to_owned(),
                scopes: vec![],
                expires_at: Timestamp(0),
            })
            .await
            .unwrap();
        store
            .add_refresh_token(RefreshToken {
                token: "live".to_owned(),
                client_id: "abc".to_owned(),
                scopes: vec![],
                expires_at: Timestamp::plus_seconds(3600),
            })
            .await
            .unwrap();

        store.sweep().await.unwrap();
        assert!(store.get_refresh_token("expired").await.is_none());
        assert!(store.get_refresh_token("live").await.is_some());
    }

    #[tokio::test]
    async fn rotate_refresh_token_is_atomic_from_callers_perspective() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::load(dir.path(), "read").await.unwrap();
        store
            .add_refresh_token(RefreshToken {
                token: "old".to_owned(),
                client_id: "abc".to_owned(),
                scopes: vec!["read".to_owned()],
                expires_at: Timestamp::plus_seconds(3600),
            })
            .await
            .unwrap();

        store
            .rotate_refresh_token(
                "old",
                AccessToken {
                    token: "new-access".to_owned(),
                    client_id: "abc".to_owned(),
                    scopes: vec!["read".to_owned()],
                    resource: None,
                    expires_at: Timestamp::plus_seconds(3600),
                },
                RefreshToken {
                    token: "new-refresh".to_owned(),
                    client_id: "abc".to_owned(),
                    scopes: vec!["read".to_owned()],
                    expires_at: Timestamp::plus_seconds(3600),
                },
            )
            .await
            .unwrap();

        assert!(store.get_refresh_token("old").await.is_none());
        assert!(store.get_refresh_token("new-refresh").await.is_some());
        assert!(store.get_access_token("new-access").await.is_some());
    }
}
