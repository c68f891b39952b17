// ABOUTME: Library root: module graph for the OAuth 2.1 authorization server
// ABOUTME: AppContext composes the Orchestrator and Introspector behind one shared Arc
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod config;
pub mod constants;
pub mod errors;
pub mod http;
pub mod introspector;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod scope;
pub mod store;
pub mod token;

use std::sync::Arc;

use config::ServerConfig;
use introspector::Introspector;
use orchestrator::Orchestrator;
use store::Store;

/// Shared application state handed to every axum handler.
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub orchestrator: Orchestrator,
    pub introspector: Introspector,
}

impl AppContext {
    #[must_use]
    pub fn new(config: Arc<ServerConfig>, store: Arc<Store>) -> Self {
        let orchestrator = Orchestrator::new(store.clone(), config.clone());
        let introspector = Introspector::new(store);
        Self {
            config,
            orchestrator,
            introspector,
        }
    }
}
