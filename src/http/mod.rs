// ABOUTME: axum Router assembly for the OAuth HTTP Surface
// ABOUTME: Wires every route in SPEC_FULL.md §4.6 onto the shared AppContext
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod handlers;
pub mod models;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::AppContext;

#[must_use]
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route(
            "/.well-known/oauth-authorization-server",
            get(handlers::discovery),
        )
        .route("/register", post(handlers::register))
        .route("/authorize", get(handlers::authorize))
        .route(
            "/oauth/login",
            get(handlers::login_page).post(handlers::login_submit),
        )
        .route("/oauth/authorize/approve", post(handlers::authorize_approve))
        .route("/oauth/:provider/callback", get(handlers::provider_callback))
        .route("/oauth/consent/page", get(handlers::consent_page))
        .route("/oauth/consent/approve", post(handlers::consent_approve))
        .route("/token", post(handlers::token))
        .route("/revoke", post(handlers::revoke))
        .route("/healthz", get(handlers::healthz))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
