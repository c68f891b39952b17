// ABOUTME: axum handler functions for the OAuth HTTP Surface (SPEC_FULL.md §4.6)
// ABOUTME: Thin translation layer: parse the wire request, call the Orchestrator, render
// ABOUTME: the response. No OAuth semantics live here.
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use tracing::warn;

use crate::orchestrator::{AuthorizeFailure, CallbackOutcome, ConsentOutcome};
use crate::AppContext;

use super::models::{
    AuthorizeRequest, ClientRegistrationRequest, ConsentDecision, LoginRequest,
    ProviderCallbackQuery, RevokeRequest, TempKeyQuery, TokenRequest,
};

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<!doctype html><html><body><h1>Authorization Error</h1><p>{}</p></body></html>",
        escape_html(message)
    );
    (status, Html(body)).into_response()
}

pub async fn discovery(State(ctx): State<Arc<AppContext>>) -> Json<serde_json::Value> {
    Json(ctx.orchestrator.discovery_metadata())
}

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

pub async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<ClientRegistrationRequest>,
) -> Response {
    match ctx.orchestrator.register_client(req).await {
        Ok(resp) => (StatusCode::CREATED, Json(resp)).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(e)).into_response(),
    }
}

pub async fn authorize(
    State(ctx): State<Arc<AppContext>>,
    Query(req): Query<AuthorizeRequest>,
) -> Response {
    match ctx.orchestrator.begin_authorize(&req).await {
        Ok(next) => Redirect::to(&next).into_response(),
        Err(AuthorizeFailure::Unvalidated(e)) => error_page(StatusCode::BAD_REQUEST, &e.0),
        Err(AuthorizeFailure::Validated(e)) => Redirect::to(&e.0).into_response(),
    }
}

pub async fn login_page(Query(q): Query<TempKeyQuery>) -> Html<String> {
    Html(format!(
        "<!doctype html><html><body><h1>Sign in</h1>\
         <form method=\"post\" action=\"/oauth/login\">\
         <input type=\"hidden\" name=\"temp_key\" value=\"{}\">\
         <label>Identifier: <input type=\"text\" name=\"identifier\" required></label>\
         <button type=\"submit\">Continue</button>\
         </form></body></html>",
        escape_html(&q.temp_key)
    ))
}

pub async fn login_submit(
    State(ctx): State<Arc<AppContext>>,
    Form(req): Form<LoginRequest>,
) -> Response {
    match ctx
        .orchestrator
        .complete_local_login(&req.temp_key, &req.identifier)
        .await
    {
        Some(next) => Redirect::to(&next).into_response(),
        None => error_page(
            StatusCode::BAD_REQUEST,
            "authorization request not found or has expired",
        ),
    }
}

pub async fn provider_callback(
    State(ctx): State<Arc<AppContext>>,
    Path(provider): Path<String>,
    Query(q): Query<ProviderCallbackQuery>,
) -> Response {
    if provider != ctx.orchestrator.provider_name() {
        return error_page(
            StatusCode::NOT_FOUND,
            "this server is not configured for that identity provider",
        );
    }
    match ctx
        .orchestrator
        .complete_provider_callback(&q.state, q.code.as_deref(), q.error.as_deref())
        .await
    {
        CallbackOutcome::Redirect(url) => Redirect::to(&url).into_response(),
        CallbackOutcome::Page(message) => {
            warn!(provider = %provider, %message, "federated callback failed before a redirect_uri was available");
            error_page(StatusCode::BAD_REQUEST, &message)
        }
    }
}

pub async fn consent_page(
    State(ctx): State<Arc<AppContext>>,
    Query(q): Query<TempKeyQuery>,
) -> Response {
    let Some((pending, client_name)) = ctx.orchestrator.consent_context(&q.temp_key).await else {
        return error_page(
            StatusCode::BAD_REQUEST,
            "authorization request not found or has expired",
        );
    };
    let action = if ctx.orchestrator.provider_name() == "custom" {
        "/oauth/authorize/approve"
    } else {
        "/oauth/consent/approve"
    };
    let display_name = client_name.unwrap_or_else(|| pending.client_id.clone());
    Html(format!(
        "<!doctype html><html><body><h1>Authorize {}</h1>\
         <p>Requested scopes: {}</p>\
         <form method=\"post\" action=\"{action}\">\
         <input type=\"hidden\" name=\"temp_key\" value=\"{}\">\
         <button type=\"submit\" name=\"approved\" value=\"true\">Allow</button>\
         <button type=\"submit\" name=\"approved\" value=\"false\">Deny</button>\
         </form></body></html>",
        escape_html(&display_name),
        escape_html(&pending.scopes.join(" ")),
        escape_html(&q.temp_key),
    ))
    .into_response()
}

pub async fn authorize_approve(
    State(ctx): State<Arc<AppContext>>,
    Form(decision): Form<ConsentDecision>,
) -> Response {
    consent_decision(&ctx, decision).await
}

pub async fn consent_approve(
    State(ctx): State<Arc<AppContext>>,
    Form(decision): Form<ConsentDecision>,
) -> Response {
    consent_decision(&ctx, decision).await
}

async fn consent_decision(ctx: &Arc<AppContext>, decision: ConsentDecision) -> Response {
    let outcome = if decision.approved {
        ctx.orchestrator.approve(&decision.temp_key).await
    } else {
        ctx.orchestrator.deny(&decision.temp_key).await
    };
    match outcome {
        ConsentOutcome::Redirect(url) => Redirect::to(&url).into_response(),
        ConsentOutcome::AlreadyProcessed => {
            (StatusCode::OK, "this authorization request has already been processed").into_response()
        }
        ConsentOutcome::NotFound => error_page(
            StatusCode::BAD_REQUEST,
            "authorization request not found or has expired",
        ),
    }
}

pub async fn token(State(ctx): State<Arc<AppContext>>, Form(req): Form<TokenRequest>) -> Response {
    match ctx.orchestrator.token(req).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(e)).into_response(),
    }
}

pub async fn revoke(State(ctx): State<Arc<AppContext>>, Form(req): Form<RevokeRequest>) -> StatusCode {
    ctx.orchestrator.revoke(&req).await;
    StatusCode::OK
}
