use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::get,
    Router,
};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::DebugMode;

use super::health;
use super::middleware::{logging_middleware, security_headers_middleware, MAX_BODY_SIZE};
use super::state::AppState;
use super::submit;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    let trace = trace_layer(state.debug);

    Router::new()
        .route("/", get(|| async { Redirect::to("/submit") }))
        .route("/submit", get(submit::show_form).post(submit::submit_form))
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(trace)
}

/// Debug mode records request headers on spans
fn trace_layer(debug: DebugMode) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    let level = if debug.is_enabled() {
        Level::DEBUG
    } else {
        Level::INFO
    };

    TraceLayer::new_for_http()
        .make_span_with(
            DefaultMakeSpan::new()
                .level(level)
                .include_headers(debug.is_enabled()),
        )
        .on_response(DefaultOnResponse::new().level(level))
}
