// ABOUTME: Internal error taxonomy for non-OAuth-wire failures
// ABOUTME: OAuth protocol errors use `http::models::OAuth2Error` instead; this type covers
// ABOUTME: configuration, storage, and upstream-provider failures
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of internal failure classes, each with a fixed HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request body or query parameters failed validation.
    InvalidInput,
    /// Requested resource (client, token, code) was not found.
    NotFound,
    /// The persisted store could not be read or written.
    StorageError,
    /// An upstream identity provider returned an error or was unreachable.
    UpstreamError,
    /// Configuration was missing or malformed at startup.
    ConfigError,
    /// Catch-all for invariant violations that should never happen in practice.
    InternalError,
}

impl ErrorCode {
    /// HTTP status this error class maps to on non-OAuth-wire endpoints.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        use crate::constants::http_status;
        match self {
            Self::InvalidInput => http_status::BAD_REQUEST,
            Self::NotFound => http_status::NOT_FOUND,
            Self::UpstreamError => http_status::BAD_GATEWAY,
            Self::StorageError | Self::ConfigError | Self::InternalError => {
                http_status::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Internal application error: a code plus a human-readable message.
#[derive(Debug, Clone, Error)]
#[error("{code:?}: {message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
}

impl AppError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamError, message)
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}
