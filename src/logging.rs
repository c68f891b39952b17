// ABOUTME: Structured logging/tracing initialization for the OAuth authorization server
// ABOUTME: Reads RUST_LOG and LOG_FORMAT, builds a tracing-subscriber pipeline
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::constants::env_vars;

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Newline-delimited JSON, suitable for log aggregation.
    Json,
    /// Human-readable multi-line output, the default for local development.
    #[default]
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

impl LogFormat {
    fn from_env_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
    pub format: LogFormat,
}

impl LoggingConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let filter = env::var(env_vars::RUST_LOG).unwrap_or_else(|_| "info".to_owned());
        let format = env::var(env_vars::LOG_FORMAT)
            .map(|s| LogFormat::from_env_str(&s))
            .unwrap_or_default();
        Self { filter, format }
    }

    /// Install this configuration as the global `tracing` subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber has already been installed.
    pub fn init(&self) -> anyhow::Result<()> {
        let env_filter = EnvFilter::try_new(&self.filter)
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(env_filter);

        match self.format {
            LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
            LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init()?,
            LogFormat::Compact => registry.with(fmt::layer().compact()).try_init()?,
        }

        Ok(())
    }
}
