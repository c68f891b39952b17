// ABOUTME: Shared numeric and string constants for the OAuth authorization server
// ABOUTME: Centralizes HTTP status codes, default TTLs, entropy floors, and env var names
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

/// HTTP status codes used outside of axum's own `StatusCode` constants (e.g. in the
/// `AppError` mapping table).
pub mod http_status {
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const NOT_FOUND: u16 = 404;
    pub const TOO_MANY_REQUESTS: u16 = 429;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const BAD_GATEWAY: u16 = 502;
}

/// Default values applied when the corresponding environment variable is unset.
pub mod defaults {
    /// Default directory for the persisted JSON store.
    pub const OAUTH_DATA_DIR: &str = ".oauth_data";
    /// Default HTTP port for the OAuth surface.
    pub const HTTP_PORT: u16 = 8080;
    /// Access token lifetime, seconds (1 hour).
    pub const ACCESS_TOKEN_TTL_SECS: i64 = 3_600;
    /// Refresh token lifetime, seconds (24 hours).
    pub const REFRESH_TOKEN_TTL_SECS: i64 = 86_400;
    /// Authorization code lifetime, seconds (10 minutes).
    pub const AUTH_CODE_TTL_SECS: i64 = 600;
    /// Pending-authorization lifetime, seconds (10 minutes).
    pub const PENDING_TTL_SECS: i64 = 600;
    /// Azure tenant segment when unset.
    pub const AZURE_TENANT: &str = "common";
    /// Default scope whitelist.
    pub const VALID_SCOPES: &[&str] = &["read", "write", "payment", "account"];
    /// Default scope grant when a request omits scopes entirely.
    pub const DEFAULT_SCOPES: &[&str] = &["read"];
    /// Minimum interval between periodic expiry sweeps, seconds.
    pub const SWEEP_INTERVAL_SECS: u64 = 60;
    /// Timeout applied to every outbound call to an upstream identity provider.
    pub const UPSTREAM_TIMEOUT_SECS: u64 = 10;
}

/// Byte lengths fed to the Token Minter's CSPRNG, chosen to clear the entropy floors
/// in SPEC_FULL.md §4.2 (128 bits for temp-keys/codes, 256 bits for access/refresh tokens).
pub mod entropy {
    /// 16 bytes = 128 bits, the floor for temp-keys and authorization codes.
    pub const TEMP_KEY_BYTES: usize = 16;
    pub const AUTH_CODE_BYTES: usize = 20;
    /// 32 bytes = 256 bits, the floor for access and refresh tokens.
    pub const ACCESS_TOKEN_BYTES: usize = 32;
    pub const REFRESH_TOKEN_BYTES: usize = 32;
}

/// Recognized environment variable names (SPEC_FULL.md §6).
pub mod env_vars {
    pub const SERVER_URL: &str = "SERVER_URL";
    pub const OAUTH_ENABLED: &str = "OAUTH_ENABLED";
    pub const OAUTH_PROVIDER: &str = "OAUTH_PROVIDER";
    pub const OAUTH_CLIENT_ID: &str = "OAUTH_CLIENT_ID";
    pub const OAUTH_CLIENT_SECRET: &str = "OAUTH_CLIENT_SECRET";
    pub const OAUTH_TENANT_ID: &str = "OAUTH_TENANT_ID";
    pub const OAUTH_VALID_SCOPES: &str = "OAUTH_VALID_SCOPES";
    pub const OAUTH_DEFAULT_SCOPES: &str = "OAUTH_DEFAULT_SCOPES";
    pub const OAUTH_ACCESS_TOKEN_TTL: &str = "OAUTH_ACCESS_TOKEN_TTL";
    pub const OAUTH_REFRESH_TOKEN_TTL: &str = "OAUTH_REFRESH_TOKEN_TTL";
    pub const OAUTH_AUTH_CODE_TTL: &str = "OAUTH_AUTH_CODE_TTL";
    pub const OAUTH_DATA_DIR: &str = "OAUTH_DATA_DIR";
    pub const HTTP_PORT: &str = "HTTP_PORT";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}
