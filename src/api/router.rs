use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{HeaderValue, ACCEPT, CONTENT_TYPE, ORIGIN};
use axum::http::{Method, Request};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::config::Settings;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = build_cors_layer(state.settings());
    let body_limit = state.settings().max_upload_bytes;

    let api = Router::new()
        .route("/upload", post(handlers::upload))
        .route("/grades", get(handlers::grades))
        .route("/course_of_action", get(handlers::course_of_action))
        .route("/performance_indicators", get(handlers::performance_indicators))
        .route("/course_summaries", get(handlers::course_summaries));

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
        )
    });

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins = settings
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT, ORIGIN])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(AllowOrigin::list(origins))
    }
}
